use std::ops::{Add, AddAssign};
use tracing::warn;

use crate::models::FumaroleType;

/// Square count matrix over an ordered set of class labels.
///
/// Rows are the actual (ground truth) class, columns the predicted class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    cells: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(labels: Vec<String>) -> Self {
        let n = labels.len();
        Self {
            labels,
            cells: vec![0; n * n],
        }
    }

    /// Matrix over every [`FumaroleType`] label
    pub fn for_fumarole_types() -> Self {
        Self::new(FumaroleType::labels())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn size(&self) -> usize {
        self.labels.len()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Count at (actual, predicted), `None` when either index is out of range
    pub fn get(&self, actual: usize, predicted: usize) -> Option<u32> {
        let n = self.size();
        if actual >= n || predicted >= n {
            return None;
        }
        Some(self.cell(actual, predicted))
    }

    pub fn row(&self, actual: usize) -> Option<&[u32]> {
        let n = self.size();
        self.cells.get(actual * n..(actual + 1) * n)
    }

    // Indices must be below `size()`
    fn cell(&self, actual: usize, predicted: usize) -> u32 {
        self.cells[actual * self.size() + predicted]
    }

    /// Record `count` classifications; unknown labels are ignored
    pub fn add_classifications(&mut self, predicted: &str, actual: &str, count: u32) {
        match (self.index_of(predicted), self.index_of(actual)) {
            (Some(p), Some(a)) => {
                let n = self.size();
                self.cells[a * n + p] += count;
            }
            _ => warn!(
                "Ignoring classification with unknown label ({} / {})",
                predicted, actual
            ),
        }
    }

    pub fn add_classification(&mut self, predicted: FumaroleType, actual: FumaroleType) {
        self.add_classifications(predicted.label(), actual.label(), 1);
    }

    /// Sum of the diagonal
    pub fn correct(&self) -> u32 {
        (0..self.size()).map(|i| self.cell(i, i)).sum()
    }

    pub fn total(&self) -> u32 {
        self.cells.iter().sum()
    }

    /// Times `label` was predicted (column sum) and times it was the
    /// actual class (row sum)
    pub fn classification_score(&self, label: &str) -> (u32, u32) {
        let Some(index) = self.index_of(label) else {
            return (0, 0);
        };
        let predicted = (0..self.size()).map(|a| self.cell(a, index)).sum();
        let actual = (0..self.size()).map(|p| self.cell(index, p)).sum();
        (predicted, actual)
    }

    pub fn accuracy(&self) -> f32 {
        ratio(self.correct(), self.total())
    }

    pub fn precision(&self, label: &str) -> f32 {
        let Some(index) = self.index_of(label) else {
            return 0.0;
        };
        let (predicted, _) = self.classification_score(label);
        ratio(self.cell(index, index), predicted)
    }

    pub fn recall(&self, label: &str) -> f32 {
        let Some(index) = self.index_of(label) else {
            return 0.0;
        };
        let (_, actual) = self.classification_score(label);
        ratio(self.cell(index, index), actual)
    }
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::for_fumarole_types()
    }
}

impl AddAssign<&ConfusionMatrix> for ConfusionMatrix {
    /// Cell-wise sum, matched by label
    fn add_assign(&mut self, other: &ConfusionMatrix) {
        if self.labels == other.labels {
            for (cell, value) in self.cells.iter_mut().zip(&other.cells) {
                *cell += value;
            }
            return;
        }

        for (a, actual) in other.labels.iter().enumerate() {
            for (p, predicted) in other.labels.iter().enumerate() {
                let count = other.cell(a, p);
                if count > 0 {
                    self.add_classifications(predicted, actual, count);
                }
            }
        }
    }
}

impl AddAssign for ConfusionMatrix {
    fn add_assign(&mut self, other: ConfusionMatrix) {
        *self += &other;
    }
}

impl Add for ConfusionMatrix {
    type Output = ConfusionMatrix;

    fn add(mut self, other: ConfusionMatrix) -> ConfusionMatrix {
        self += &other;
        self
    }
}

/// `numerator / denominator`, with a zero denominator treated as 1
pub fn ratio(numerator: u32, denominator: u32) -> f32 {
    numerator as f32 / denominator.max(1) as f32
}
