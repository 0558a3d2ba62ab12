/// Machine-learning layer: training, persistence, and inference for the
/// course-completion classifier.
pub mod boosting;
pub mod models;
pub mod predictor;
pub mod risk;
pub mod scaler;
pub mod service;
pub mod store;
pub mod trainer;

pub use boosting::{BoostingParams, GradientBoostedClassifier};
pub use models::{LabeledDataset, ModelMetrics, TrainedArtifact, TrainingMetadata};
pub use predictor::Predictor;
pub use risk::RiskAssessor;
pub use scaler::StandardScaler;
pub use service::MlService;
pub use store::ModelStore;
pub use trainer::ModelTrainer;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::EngagementWeights;
    use crate::models::{FeatureRecord, StudentRecord};
    use crate::pipeline::derive_features;

    /// Half strong students, half struggling; grades split cleanly around
    /// the median, so a trained model separates the two groups.
    pub(crate) fn synthetic_population(n: usize) -> Vec<FeatureRecord> {
        let raw: Vec<StudentRecord> = (0..n)
            .map(|i| {
                let strong = i % 2 == 0;
                let jitter = (i % 5) as f64;
                StudentRecord {
                    study_hours: Some(if strong { 14.0 + jitter } else { 3.0 + jitter * 0.2 }),
                    attendance: Some(if strong { 92.0 - jitter } else { 48.0 - jitter }),
                    assignment_completion: Some(if strong { 95.0 - jitter } else { 40.0 + jitter }),
                    discussions: Some(if strong { 8.0 } else { 1.0 }),
                    resources: Some(if strong { 10.0 } else { 2.0 }),
                    stress_level: Some(if strong { 25.0 + jitter } else { 75.0 + jitter }),
                    internet: Some(1.0),
                    edu_tech: Some(if strong { 1.0 } else { 0.0 }),
                    online_courses: Some(f64::from(u8::from(i % 3 == 0))),
                    exam_score: Some(if strong { 85.0 - jitter } else { 45.0 + jitter }),
                    final_grade: Some(if strong { 88.0 - jitter } else { 42.0 + jitter }),
                    ..Default::default()
                }
            })
            .collect();
        derive_features(&raw, &EngagementWeights::default())
    }
}
