use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::detection::FumaroleDetectionsPerImage;
use crate::evaluation::AlgorithmEvaluation;
use crate::evaluation::confusion::ConfusionMatrix;
use crate::evaluation::metrics::{DetectionCounts, IouMetric};
use crate::models::{BoundingBox, FumaroleDetection};

pub const DETECTION_METRICS_FILE: &str = "detection_metrics.csv";
pub const IOU_METRICS_FILE: &str = "iou_metrics.csv";
pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

/// One row of a per-image detection (or ground truth) file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
    pub width: i32,
    pub height: i32,
    pub class_label: String,
}

impl DetectionRecord {
    pub fn from_detection(detection: &FumaroleDetection) -> Self {
        let b = detection.bounding_box;
        Self {
            x_min: b.x,
            x_max: b.right(),
            y_min: b.y,
            y_max: b.bottom(),
            width: b.width,
            height: b.height,
            class_label: detection.kind.label().to_string(),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.x_min,
            self.y_min,
            self.x_max - self.x_min,
            self.y_max - self.y_min,
        )
    }
}

#[derive(Debug, Serialize)]
struct DetectionMetricRow {
    threshold: u32,
    true_positives: u32,
    false_positives: u32,
    precision: f32,
}

#[derive(Debug, Serialize)]
struct IouMetricRow {
    threshold: f32,
    success_rate: f32,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    image_id: &'a str,
    detected: usize,
    actual: usize,
    average_iou: f32,
    accuracy: f32,
}

pub fn write_detections_csv(path: &Path, detections: &[FumaroleDetection]) -> Result<()> {
    // Header written by hand so files of images without detections still carry it
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;
    wtr.write_record(["x_min", "x_max", "y_min", "y_max", "width", "height", "class_label"])?;

    for detection in detections {
        wtr.serialize(DetectionRecord::from_detection(detection))?;
    }
    wtr.flush()?;
    Ok(())
}

/// One `<image_id>.csv` per image in `output_dir`
pub fn write_detections(output_dir: &Path, detections: &FumaroleDetectionsPerImage) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;

    for (image_id, image_detections) in detections {
        write_detections_csv(&output_dir.join(format!("{}.csv", image_id)), image_detections)?;
    }

    info!("Wrote detections for {} images to {}", detections.len(), output_dir.display());
    Ok(())
}

pub fn write_detection_metrics_csv(
    path: &Path,
    metrics: &BTreeMap<u32, DetectionCounts>,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;

    for (&threshold, counts) in metrics {
        wtr.serialize(DetectionMetricRow {
            threshold,
            true_positives: counts.true_positives,
            false_positives: counts.false_positives,
            precision: counts.precision(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_iou_metrics_csv(path: &Path, metrics: &[IouMetric]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;

    for metric in metrics {
        wtr.serialize(IouMetricRow {
            threshold: metric.threshold,
            success_rate: metric.success_rate,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Class by class grid, rows are actual classes and columns predicted ones
pub fn write_confusion_matrix_csv(path: &Path, matrix: &ConfusionMatrix) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;

    let mut header = vec!["actual\\predicted".to_string()];
    header.extend(matrix.labels().iter().cloned());
    wtr.write_record(&header)?;

    for (a, label) in matrix.labels().iter().enumerate() {
        let mut record = vec![label.clone()];
        record.extend(matrix.row(a).unwrap_or(&[]).iter().map(|count| count.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per image followed by a `total` row
pub fn write_summary_csv(path: &Path, evaluation: &AlgorithmEvaluation) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create {}", path.display()))?;

    for e in &evaluation.evaluations {
        wtr.serialize(SummaryRow {
            image_id: &e.image_id,
            detected: e.number_detected,
            actual: e.number_of_actual_fumaroles,
            average_iou: e.average_iou,
            accuracy: e.confusion_matrix.accuracy(),
        })?;
    }

    wtr.serialize(SummaryRow {
        image_id: "total",
        detected: evaluation.total_number_detected,
        actual: evaluation.total_number_of_actual_fumaroles,
        average_iou: evaluation.total_average_iou,
        accuracy: evaluation.confusion_matrix.accuracy(),
    })?;
    wtr.flush()?;
    Ok(())
}

/// Write all aggregate reports of `evaluation` into `output_dir`
pub fn write_evaluation_reports(output_dir: &Path, evaluation: &AlgorithmEvaluation) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;

    write_detection_metrics_csv(
        &output_dir.join(DETECTION_METRICS_FILE),
        &evaluation.detection_metrics,
    )?;
    write_iou_metrics_csv(
        &output_dir.join(IOU_METRICS_FILE),
        &evaluation.iou_detection_metrics,
    )?;
    write_confusion_matrix_csv(
        &output_dir.join(CONFUSION_MATRIX_FILE),
        &evaluation.confusion_matrix,
    )?;
    write_summary_csv(&output_dir.join(SUMMARY_FILE), evaluation)?;

    info!("Wrote evaluation reports to {}", output_dir.display());
    Ok(())
}
