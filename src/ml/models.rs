use chrono::{DateTime, Utc};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ml::boosting::GradientBoostedClassifier;
use crate::ml::scaler::StandardScaler;

/// Evaluation metrics of a trained model, computed on the held-out
/// partition. Values are rounded to 4 decimals for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl ModelMetrics {
    /// Binary metrics with the positive class = 1. Degenerate cases (a class
    /// absent from predictions or truth) score 0, never an error.
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Self {
        let n = y_true.len();
        if n == 0 {
            return Self {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1_score: 0.0,
            };
        }

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        let accuracy = correct as f64 / n as f64;

        let tp = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t == 1 && **p == 1)
            .count();
        let fp = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t == 0 && **p == 1)
            .count();
        let fn_count = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| **t == 1 && **p == 0)
            .count();

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy: round4(accuracy),
            precision: round4(precision),
            recall: round4(recall),
            f1_score: round4(f1),
        }
    }
}

/// Round to 4 decimals for reported metrics and importances.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Metadata persisted alongside the model and scaler.
///
/// `feature_names` is authoritative: scaling and model weights are
/// positional, so inference must replay features in exactly this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Training timestamp
    pub trained_at: DateTime<Utc>,

    /// Ordered feature names used at training time
    pub feature_names: Vec<String>,

    /// Per-feature importance weights, normalized to sum 1
    pub feature_importance: HashMap<String, f64>,

    /// Held-out evaluation metrics
    pub metrics: ModelMetrics,

    /// Number of training samples
    pub training_samples: usize,

    /// Number of held-out test samples
    pub test_samples: usize,
}

/// One trained model generation: classifier, fitted scaler, and metadata.
///
/// Created whole by one trainer run, fully replaced (never merged) by the
/// next, and handed to callers as an immutable snapshot.
#[derive(Debug)]
pub struct TrainedArtifact {
    pub model: GradientBoostedClassifier,
    pub scaler: StandardScaler,
    pub metadata: TrainingMetadata,
}

/// A labeled feature matrix ready for splitting and fitting.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    /// Feature matrix (n_samples x n_features)
    pub features: Array2<f64>,

    /// Binary labels, positive class = 1
    pub labels: Vec<usize>,
}

impl LabeledDataset {
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Seeded stratified train/test split preserving class proportions.
    ///
    /// Falls back to a plain shuffled split when stratification is
    /// infeasible (a class with fewer than 2 members), rather than failing.
    pub fn stratified_split(&self, test_fraction: f64, seed: u64) -> (LabeledDataset, LabeledDataset) {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = self.n_samples();

        let positives: Vec<usize> = (0..n).filter(|&i| self.labels[i] == 1).collect();
        let negatives: Vec<usize> = (0..n).filter(|&i| self.labels[i] == 0).collect();

        let stratifiable = positives.len() >= 2 && negatives.len() >= 2;

        let (mut test_idx, mut train_idx) = if stratifiable {
            let mut test = Vec::new();
            let mut train = Vec::new();
            for class_indices in [&positives, &negatives] {
                let mut shuffled = class_indices.to_vec();
                shuffled.shuffle(&mut rng);
                let n_test = class_test_size(shuffled.len(), test_fraction);
                test.extend_from_slice(&shuffled[..n_test]);
                train.extend_from_slice(&shuffled[n_test..]);
            }
            (test, train)
        } else {
            let mut shuffled: Vec<usize> = (0..n).collect();
            shuffled.shuffle(&mut rng);
            let n_test = class_test_size(n, test_fraction);
            (shuffled[..n_test].to_vec(), shuffled[n_test..].to_vec())
        };

        // Keep row order deterministic within each partition.
        test_idx.sort_unstable();
        train_idx.sort_unstable();

        (self.subset(&train_idx), self.subset(&test_idx))
    }

    fn subset(&self, indices: &[usize]) -> LabeledDataset {
        LabeledDataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Test partition size for a group: at least one row held out, at least one
/// kept for training.
fn class_test_size(count: usize, test_fraction: f64) -> usize {
    ((count as f64 * test_fraction).round() as usize).clamp(1, count.saturating_sub(1).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn dataset(labels: Vec<usize>) -> LabeledDataset {
        let n = labels.len();
        let features =
            Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        LabeledDataset { features, labels }
    }

    #[test]
    fn test_metrics_perfect_predictions() {
        let y = vec![0, 1, 1, 0, 1];
        let metrics = ModelMetrics::from_predictions(&y, &y);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
        assert_eq!(metrics.f1_score, 1.0);
    }

    #[test]
    fn test_metrics_zero_division_defaults() {
        // No positive predictions and no positive truth: everything is 0,
        // never a panic.
        let metrics = ModelMetrics::from_predictions(&[0, 0, 0], &[0, 0, 0]);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1_score, 0.0);
    }

    #[test]
    fn test_metrics_mixed() {
        let y_true = vec![1, 1, 0, 0];
        let y_pred = vec![1, 0, 1, 0];
        let metrics = ModelMetrics::from_predictions(&y_true, &y_pred);
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert_eq!(metrics.f1_score, 0.5);
    }

    #[test]
    fn test_stratified_split_preserves_both_classes() {
        let labels: Vec<usize> = (0..50).map(|i| i % 2).collect();
        let data = dataset(labels);

        let (train, test) = data.stratified_split(0.2, 42);

        assert_eq!(train.n_samples() + test.n_samples(), 50);
        assert_eq!(test.n_samples(), 10);
        assert!(train.labels.contains(&0) && train.labels.contains(&1));
        assert!(test.labels.contains(&0) && test.labels.contains(&1));
    }

    #[test]
    fn test_split_is_reproducible() {
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i % 3 == 0)).collect();
        let data = dataset(labels);

        let (train_a, test_a) = data.stratified_split(0.2, 42);
        let (train_b, test_b) = data.stratified_split(0.2, 42);

        assert_eq!(train_a.labels, train_b.labels);
        assert_eq!(test_a.labels, test_b.labels);
        assert_eq!(train_a.features, train_b.features);
    }

    #[test]
    fn test_split_falls_back_when_class_too_small() {
        // One positive sample: stratification is infeasible, plain split runs.
        let mut labels = vec![0; 12];
        labels[3] = 1;
        let data = dataset(labels);

        let (train, test) = data.stratified_split(0.2, 42);
        assert_eq!(train.n_samples() + test.n_samples(), 12);
        assert!(!test.labels.is_empty());
        assert!(!train.labels.is_empty());
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }
}
