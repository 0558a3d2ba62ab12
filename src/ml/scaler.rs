use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Zero-mean/unit-variance feature scaler.
///
/// Fitted on the training partition only, then applied to both partitions
/// and to every inference vector. Columns are positional: the scaler is only
/// valid for vectors built in the feature order it was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and standard deviation.
    pub fn fit(features: &Array2<f64>) -> Self {
        let means = features
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; features.ncols()]);

        // Constant columns scale by 1 instead of dividing by zero.
        let stds = features
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Self { means, stds }
    }

    /// Scale a matrix column-wise.
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut scaled = features.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| (v - self.means[j]) / self.stds[j]);
        }
        scaled
    }

    /// Scale a single feature vector.
    pub fn transform_vec(&self, vector: &[f64]) -> Vec<f64> {
        vector
            .iter()
            .enumerate()
            .map(|(j, &v)| (v - self.means[j]) / self.stds[j])
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }
}
