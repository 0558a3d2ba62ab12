//! Gradient-boosted tree ensemble for binary classification.
//!
//! Logistic-loss boosting over regression trees: each round fits a tree to
//! the pseudo-residuals of the running log-odds score and adds its shrunken
//! prediction to the score. The fit is deterministic for a given dataset and
//! parameter set.

use crate::error::{AppError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

/// Boosting hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Number of boosting rounds (weak learners)
    pub n_estimators: usize,

    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,

    /// Maximum depth of each tree
    pub max_depth: u16,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 5,
        }
    }
}

/// A fitted gradient-boosted binary classifier.
#[derive(Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    /// Log-odds prior of the positive class
    initial_score: f64,

    /// Shrinkage used at fit time, replayed at prediction time
    learning_rate: f64,

    /// Expected feature vector width
    n_features: usize,

    /// Weak learners in boosting order
    trees: Vec<DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
}

impl std::fmt::Debug for GradientBoostedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientBoostedClassifier")
            .field("initial_score", &self.initial_score)
            .field("learning_rate", &self.learning_rate)
            .field("n_features", &self.n_features)
            .field("n_trees", &self.trees.len())
            .finish()
    }
}

impl GradientBoostedClassifier {
    /// Fit the ensemble on a scaled feature matrix and binary labels.
    pub fn fit(features: &Array2<f64>, labels: &[usize], params: BoostingParams) -> Result<Self> {
        let n_samples = features.nrows();
        if n_samples == 0 || n_samples != labels.len() {
            return Err(AppError::Internal(format!(
                "feature matrix rows ({}) do not match labels ({})",
                n_samples,
                labels.len()
            )));
        }

        let targets: Vec<f64> = labels.iter().map(|&y| y as f64).collect();

        // Prior log-odds, clamped away from the degenerate single-class edges.
        let positive_rate =
            (targets.iter().sum::<f64>() / n_samples as f64).clamp(1e-6, 1.0 - 1e-6);
        let initial_score = (positive_rate / (1.0 - positive_rate)).ln();

        let x = ndarray_to_dense(features);
        let mut scores = vec![initial_score; n_samples];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&scores)
                .map(|(y, s)| y - sigmoid(*s))
                .collect();

            let tree_params =
                DecisionTreeRegressorParameters::default().with_max_depth(params.max_depth);
            let tree = DecisionTreeRegressor::fit(&x, &residuals, tree_params)
                .map_err(|e| AppError::Internal(format!("failed to fit boosting tree: {}", e)))?;

            let updates = tree
                .predict(&x)
                .map_err(|e| AppError::Internal(format!("boosting tree prediction failed: {}", e)))?;
            for (score, update) in scores.iter_mut().zip(&updates) {
                *score += params.learning_rate * update;
            }

            trees.push(tree);
        }

        Ok(Self {
            initial_score,
            learning_rate: params.learning_rate,
            n_features: features.ncols(),
            trees,
        })
    }

    /// Class probability pairs (n_samples x 2), column 1 = will-complete.
    pub fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.n_features {
            return Err(AppError::Internal(format!(
                "expected {} features, got {}",
                self.n_features,
                features.ncols()
            )));
        }

        let x = ndarray_to_dense(features);
        let mut scores = vec![self.initial_score; features.nrows()];

        for tree in &self.trees {
            let updates = tree
                .predict(&x)
                .map_err(|e| AppError::Internal(format!("boosting tree prediction failed: {}", e)))?;
            for (score, update) in scores.iter_mut().zip(&updates) {
                *score += self.learning_rate * update;
            }
        }

        let mut proba = Array2::zeros((features.nrows(), 2));
        for (i, score) in scores.iter().enumerate() {
            let p = sigmoid(*score);
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }

    /// Arg-max class labels.
    pub fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(features)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| usize::from(row[1] >= row[0]))
            .collect())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn ndarray_to_dense(arr: &Array2<f64>) -> DenseMatrix<f64> {
    let shape = arr.shape();
    let data: Vec<f64> = arr.iter().copied().collect();
    DenseMatrix::new(shape[0], shape[1], data, false)
}
