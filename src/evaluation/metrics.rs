use std::collections::BTreeMap;

use crate::evaluation::confusion::ratio;
use crate::models::BoundingBox;

/// Intersection over union, 0 when the boxes do not overlap
pub fn compute_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let Some(intersection) = a.intersection(b) else {
        return 0.0;
    };

    let intersection_area = intersection.area();
    let union_area = a.area() + b.area() - intersection_area;
    if union_area <= 0 {
        return 0.0;
    }

    intersection_area as f32 / union_area as f32
}

/// True and false positives at one distance threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionCounts {
    pub true_positives: u32,
    pub false_positives: u32,
}

impl DetectionCounts {
    pub fn precision(&self) -> f32 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }
}

impl std::ops::AddAssign for DetectionCounts {
    fn add_assign(&mut self, other: DetectionCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
    }
}

/// Share of detections whose IoU reaches `threshold`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IouMetric {
    pub threshold: f32,
    pub success_rate: f32,
}

/// `min, min + step, ...` up to and including `max`
pub fn detection_thresholds(min: u32, max: u32, step: u32) -> Vec<u32> {
    if step == 0 {
        return vec![min];
    }
    (min..=max).step_by(step as usize).collect()
}

/// `0, step, 2 * step, ...` up to and including 1
pub fn iou_thresholds(step: f32) -> Vec<f32> {
    if step <= 0.0 {
        return vec![0.0];
    }
    let count = (1.0 / step + 1e-4).floor() as usize;
    (0..=count).map(|i| (i as f32 * step).min(1.0)).collect()
}

fn squared_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}

/// Count true and false positives per squared centroid distance threshold.
///
/// A ground truth centroid with at least one detection within the
/// threshold is a true positive and every further detection near it a
/// false positive. Detections near no ground truth centroid are false
/// positives as well.
pub fn compute_detection_metrics(
    detections: &[(f32, f32)],
    truth: &[(f32, f32)],
    thresholds: &[u32],
) -> BTreeMap<u32, DetectionCounts> {
    let mut metrics = BTreeMap::new();

    for &t in thresholds {
        let t_f = t as f32;
        let mut counts = DetectionCounts::default();

        // Ground truth side: one hit per centroid, extra hits are duplicates
        for &y in truth {
            let within = detections
                .iter()
                .filter(|&&x| squared_distance(x, y) <= t_f)
                .count() as u32;

            if within > 0 {
                counts.true_positives += 1;
                counts.false_positives += within - 1;
            }
        }

        // Detections near nothing
        let unmatched = detections
            .iter()
            .filter(|&&x| truth.iter().all(|&y| squared_distance(x, y) > t_f))
            .count() as u32;
        counts.false_positives += unmatched;

        metrics.insert(t, counts);
    }

    metrics
}

/// Success rate per IoU threshold; 0 everywhere when there are no scores
pub fn compute_iou_metrics(ious: &[f32], thresholds: &[f32]) -> Vec<IouMetric> {
    thresholds
        .iter()
        .map(|&threshold| {
            let passed = ious.iter().filter(|&&iou| iou >= threshold).count() as u32;
            IouMetric {
                threshold,
                success_rate: if ious.is_empty() {
                    0.0
                } else {
                    ratio(passed, ious.len() as u32)
                },
            }
        })
        .collect()
}
