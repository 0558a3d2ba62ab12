use crate::config::RiskThresholds;
use crate::error::{AppError, Result};
use crate::ml::models::TrainedArtifact;
use crate::models::{FeatureRecord, PredictionResult, RiskBand};
use ndarray::Array2;

/// Pure inference over an explicit artifact snapshot.
///
/// Read-only: holds no model state of its own, so any number of calls may
/// run concurrently against the same `TrainedArtifact`.
pub struct Predictor {
    thresholds: RiskThresholds,
}

impl Predictor {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Predict completion likelihood for one record.
    pub fn predict(
        &self,
        artifact: &TrainedArtifact,
        record: &FeatureRecord,
    ) -> Result<PredictionResult> {
        let vector = feature_vector(artifact, record);
        let scaled = artifact.scaler.transform_vec(&vector);

        let n = scaled.len();
        let features = Array2::from_shape_vec((1, n), scaled)
            .map_err(|e| AppError::Internal(format!("failed to build feature array: {}", e)))?;
        let proba = artifact.model.predict_proba(&features)?;

        let p_incomplete = proba[[0, 0]];
        let p_complete = proba[[0, 1]];
        let likelihood = p_complete * 100.0;

        Ok(PredictionResult {
            student_id: record.student_id.clone(),
            will_complete: p_complete >= p_incomplete,
            completion_likelihood: round2(likelihood),
            confidence: round2(p_complete.max(p_incomplete) * 100.0),
            risk_band: self.band(likelihood),
        })
    }

    fn band(&self, likelihood: f64) -> RiskBand {
        if likelihood >= self.thresholds.low_band_likelihood {
            RiskBand::Low
        } else if likelihood >= self.thresholds.medium_band_likelihood {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }
}

/// Build the positional feature vector by replaying the artifact's ordered
/// feature names against the record. A feature recorded at training time but
/// absent from this record defaults to 0 rather than failing, since a record
/// may lack a column the training set happened to include.
pub fn feature_vector(artifact: &TrainedArtifact, record: &FeatureRecord) -> Vec<f64> {
    artifact
        .metadata
        .feature_names
        .iter()
        .map(|name| record.feature(name).unwrap_or(0.0))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
