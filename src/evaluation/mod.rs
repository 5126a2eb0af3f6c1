pub mod confusion;
pub mod metrics;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::{Config, ConfigError};
use crate::detection::FumaroleDetectionsPerImage;
use crate::models::{FumaroleDetection, FumaroleType, GroundTruthAnnotation};
use confusion::ConfusionMatrix;
use metrics::{DetectionCounts, IouMetric};

/// Ground truth annotations per image, keyed by image ID
pub type GroundTruthPerImage = BTreeMap<String, Vec<GroundTruthAnnotation>>;

#[derive(Debug, Clone, Copy)]
pub struct EvaluationSettings {
    /// Squared centroid distance sweep
    pub detection_threshold_min: u32,
    pub detection_threshold_max: u32,
    pub detection_threshold_step: u32,
    /// IoU sweep step over [0, 1]
    pub iou_threshold_step: f32,
}

impl EvaluationSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let read_u32 = |key: &str| -> Result<u32, ConfigError> {
            let value = config.get_int(key)?;
            u32::try_from(value).map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                reason: format!("{} is not a non-negative 32-bit integer", value),
            })
        };

        let settings = Self {
            detection_threshold_min: read_u32("evaluation.detection.threshold_min")?,
            detection_threshold_max: read_u32("evaluation.detection.threshold_max")?,
            detection_threshold_step: read_u32("evaluation.detection.threshold_step")?,
            iou_threshold_step: config.get_float("evaluation.iou.threshold_step")? as f32,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection_threshold_step == 0 {
            return Err(ConfigError::Invalid {
                key: "evaluation.detection.threshold_step".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if self.detection_threshold_min > self.detection_threshold_max {
            return Err(ConfigError::Invalid {
                key: "evaluation.detection.threshold_min".to_string(),
                reason: "must not exceed threshold_max".to_string(),
            });
        }
        if !(self.iou_threshold_step > 0.0 && self.iou_threshold_step <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "evaluation.iou.threshold_step".to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        Ok(())
    }

    pub fn detection_thresholds(&self) -> Vec<u32> {
        metrics::detection_thresholds(
            self.detection_threshold_min,
            self.detection_threshold_max,
            self.detection_threshold_step,
        )
    }

    pub fn iou_thresholds(&self) -> Vec<f32> {
        metrics::iou_thresholds(self.iou_threshold_step)
    }
}

/// Evaluation of the detections of a single image
#[derive(Debug, Clone)]
pub struct FumaroleDetectionEvaluation {
    pub image_id: String,
    pub number_detected: usize,
    pub number_of_actual_fumaroles: usize,
    /// Best IoU of every detection, in detection order
    pub ious: Vec<f32>,
    pub average_iou: f32,
    pub confusion_matrix: ConfusionMatrix,
    pub detection_metrics: BTreeMap<u32, DetectionCounts>,
    pub iou_metrics: Vec<IouMetric>,
}

/// Evaluation over every image of a run
#[derive(Debug, Clone)]
pub struct AlgorithmEvaluation {
    pub total_number_detected: usize,
    pub total_number_of_actual_fumaroles: usize,
    /// Mean of the per-image average IoUs
    pub total_average_iou: f32,
    pub confusion_matrix: ConfusionMatrix,
    /// Counts summed over images
    pub detection_metrics: BTreeMap<u32, DetectionCounts>,
    /// Success rates averaged over images
    pub iou_detection_metrics: Vec<IouMetric>,
    pub evaluations: Vec<FumaroleDetectionEvaluation>,
}

/// Scores detections against ground truth
#[derive(Debug, Clone)]
pub struct AlgorithmEvaluator {
    detection_thresholds: Vec<u32>,
    iou_thresholds: Vec<f32>,
}

impl AlgorithmEvaluator {
    pub fn new(settings: EvaluationSettings) -> Self {
        Self {
            detection_thresholds: settings.detection_thresholds(),
            iou_thresholds: settings.iou_thresholds(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(EvaluationSettings::from_config(config)?))
    }

    /// Evaluate every image that has detections or ground truth.
    ///
    /// Missing detections count as none detected, missing ground truth as
    /// no actual fumaroles.
    pub fn evaluate_detection_pipeline(
        &self,
        results: &FumaroleDetectionsPerImage,
        truth: &GroundTruthPerImage,
    ) -> AlgorithmEvaluation {
        // Union of both sides, sorted by image id
        let image_ids: BTreeSet<&String> = truth.keys().chain(results.keys()).collect();

        let mut eval = AlgorithmEvaluation {
            total_number_detected: 0,
            total_number_of_actual_fumaroles: 0,
            total_average_iou: 0.0,
            confusion_matrix: ConfusionMatrix::for_fumarole_types(),
            detection_metrics: self
                .detection_thresholds
                .iter()
                .map(|&t| (t, DetectionCounts::default()))
                .collect(),
            iou_detection_metrics: Vec::new(),
            evaluations: Vec::with_capacity(image_ids.len()),
        };

        for image_id in image_ids {
            let detections = results.get(image_id).map(Vec::as_slice).unwrap_or(&[]);
            let annotations = truth.get(image_id).map(Vec::as_slice).unwrap_or(&[]);

            let mut single = self.evaluate_detections(detections, annotations);
            single.image_id = image_id.clone();

            // Accumulate totals
            eval.total_number_detected += single.number_detected;
            eval.total_number_of_actual_fumaroles += single.number_of_actual_fumaroles;
            eval.confusion_matrix += &single.confusion_matrix;
            for (t, counts) in &single.detection_metrics {
                *eval.detection_metrics.entry(*t).or_default() += *counts;
            }

            debug!(
                "{}: detected {}, actual {}, average IoU {:.3}",
                single.image_id,
                single.number_detected,
                single.number_of_actual_fumaroles,
                single.average_iou
            );
            eval.evaluations.push(single);
        }

        // Averages over images
        let n = eval.evaluations.len().max(1) as f32;
        eval.total_average_iou = eval.evaluations.iter().map(|e| e.average_iou).sum::<f32>() / n;
        eval.iou_detection_metrics = self
            .iou_thresholds
            .iter()
            .enumerate()
            .map(|(i, &threshold)| IouMetric {
                threshold,
                success_rate: eval
                    .evaluations
                    .iter()
                    .map(|e| e.iou_metrics.get(i).map(|m| m.success_rate).unwrap_or(0.0))
                    .sum::<f32>()
                    / n,
            })
            .collect();

        info!(
            "Evaluated {} images: detected {}, actual {}, average IoU {:.3}, accuracy {:.3}",
            eval.evaluations.len(),
            eval.total_number_detected,
            eval.total_number_of_actual_fumaroles,
            eval.total_average_iou,
            eval.confusion_matrix.accuracy()
        );

        eval
    }

    /// Evaluate the detections of one image.
    ///
    /// Each detection is matched to the ground truth box with the highest
    /// IoU, the first one on ties. Without any ground truth the detection is
    /// recorded against the `unknown` class.
    pub fn evaluate_detections(
        &self,
        results: &[FumaroleDetection],
        truth: &[GroundTruthAnnotation],
    ) -> FumaroleDetectionEvaluation {
        let mut confusion_matrix = ConfusionMatrix::for_fumarole_types();
        let mut ious = Vec::with_capacity(results.len());

        for detection in results {
            match best_match(detection, truth) {
                Some((index, iou)) => {
                    ious.push(iou);
                    confusion_matrix.add_classification(detection.kind, truth[index].kind);
                }
                None => {
                    ious.push(0.0);
                    confusion_matrix.add_classification(detection.kind, FumaroleType::Unknown);
                }
            }
        }

        // Centroid based detection counts
        let detected_centroids: Vec<(f32, f32)> = results.iter().map(|d| d.center()).collect();
        let truth_centroids: Vec<(f32, f32)> = truth.iter().map(|t| t.center()).collect();

        let average_iou = ious.iter().sum::<f32>() / ious.len().max(1) as f32;

        FumaroleDetectionEvaluation {
            image_id: String::new(),
            number_detected: results.len(),
            number_of_actual_fumaroles: truth.len(),
            average_iou,
            confusion_matrix,
            detection_metrics: metrics::compute_detection_metrics(
                &detected_centroids,
                &truth_centroids,
                &self.detection_thresholds,
            ),
            iou_metrics: metrics::compute_iou_metrics(&ious, &self.iou_thresholds),
            ious,
        }
    }
}

/// Index and IoU of the ground truth box overlapping `detection` most
fn best_match(
    detection: &FumaroleDetection,
    truth: &[GroundTruthAnnotation],
) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (index, annotation) in truth.iter().enumerate() {
        let iou = metrics::compute_iou(&detection.bounding_box, &annotation.bounding_box);
        match best {
            Some((_, best_iou)) if iou <= best_iou => {}
            _ => best = Some((index, iou)),
        }
    }

    best
}
