use crate::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::ml::boosting::{BoostingParams, GradientBoostedClassifier};
use crate::ml::models::{round4, LabeledDataset, ModelMetrics, TrainedArtifact, TrainingMetadata};
use crate::ml::scaler::StandardScaler;
use crate::models::{names, FeatureRecord};
use chrono::Utc;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::{debug, info};

/// Fixed candidate feature list, extended with derived fields; filtered to
/// the columns actually present in the population. The resulting order is
/// authoritative for the artifact's positional feature vector.
fn candidate_features() -> [&'static str; 12] {
    [
        names::STUDY_HOURS,
        names::ATTENDANCE,
        names::ASSIGNMENT_COMPLETION,
        names::DISCUSSIONS,
        names::RESOURCES,
        names::STRESS_LEVEL,
        names::INTERNET,
        names::EDU_TECH,
        names::ONLINE_COURSES,
        names::ENGAGEMENT_SCORE,
        names::RISK_SCORE,
        names::CONSISTENCY,
    ]
}

/// Trains the completion classifier over the full feature-bearing
/// population and produces one complete artifact generation.
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Train on the full current population.
    ///
    /// Fails with a typed error on too-small populations, a missing label
    /// source, or a single-class label; never leaves a partial artifact.
    pub fn train(&self, records: &[FeatureRecord]) -> Result<TrainedArtifact> {
        if records.len() < self.config.min_samples {
            return Err(AppError::InsufficientData(format!(
                "need at least {} student records, got {}",
                self.config.min_samples,
                records.len()
            )));
        }

        let feature_names = self.available_features(records);
        if feature_names.is_empty() {
            return Err(AppError::InsufficientData(
                "no usable feature columns in population".to_string(),
            ));
        }

        let labels = self.build_labels(records)?;
        if !labels.contains(&0) || !labels.contains(&1) {
            return Err(AppError::ImbalancedTarget(
                "all students share the same outcome; both classes are required".to_string(),
            ));
        }

        let features = self.feature_matrix(records, &feature_names);
        let dataset = LabeledDataset { features, labels };

        let (train, test) = dataset.stratified_split(self.config.test_fraction, self.config.seed);
        debug!(
            training_samples = train.n_samples(),
            test_samples = test.n_samples(),
            n_features = feature_names.len(),
            "Split training population"
        );

        // Scaler is fitted on the training partition only.
        let scaler = StandardScaler::fit(&train.features);
        let train_scaled = scaler.transform(&train.features);
        let test_scaled = scaler.transform(&test.features);

        let model = GradientBoostedClassifier::fit(
            &train_scaled,
            &train.labels,
            BoostingParams {
                n_estimators: self.config.n_estimators,
                learning_rate: self.config.learning_rate,
                max_depth: self.config.max_depth,
            },
        )?;

        let predictions = model.predict(&test_scaled)?;
        let metrics = ModelMetrics::from_predictions(&test.labels, &predictions);

        let feature_importance = permutation_importance(
            &model,
            &train_scaled,
            &train.labels,
            &feature_names,
            self.config.seed,
        )?;

        info!(
            accuracy = metrics.accuracy,
            f1_score = metrics.f1_score,
            training_samples = train.n_samples(),
            "Completion model trained"
        );

        let metadata = TrainingMetadata {
            trained_at: Utc::now(),
            feature_names,
            feature_importance,
            metrics,
            training_samples: train.n_samples(),
            test_samples: test.n_samples(),
        };

        Ok(TrainedArtifact {
            model,
            scaler,
            metadata,
        })
    }

    /// Candidate columns present anywhere in the population, in fixed order.
    fn available_features(&self, records: &[FeatureRecord]) -> Vec<String> {
        candidate_features()
            .iter()
            .filter(|name| records.iter().any(|r| r.feature(name).is_some()))
            .map(|name| name.to_string())
            .collect()
    }

    /// Binary target: final grade at or above the population median, falling
    /// back to risk score at or below the median when no grade column exists.
    fn build_labels(&self, records: &[FeatureRecord]) -> Result<Vec<usize>> {
        let grades: Vec<f64> = records.iter().filter_map(|r| r.final_grade).collect();
        if !grades.is_empty() {
            let grade_median = median(&grades);
            return Ok(records
                .iter()
                .map(|r| usize::from(r.final_grade.map_or(false, |g| g >= grade_median)))
                .collect());
        }

        let risks: Vec<f64> = records
            .iter()
            .filter_map(|r| r.feature(names::RISK_SCORE))
            .collect();
        if !risks.is_empty() {
            let risk_median = median(&risks);
            return Ok(records
                .iter()
                .map(|r| usize::from(r.risk_score <= risk_median))
                .collect());
        }

        Err(AppError::NoTargetVariable(
            "neither FinalGrade nor RiskScore present in population".to_string(),
        ))
    }

    /// Positional feature matrix; a field missing from a record reads as 0.
    fn feature_matrix(&self, records: &[FeatureRecord], feature_names: &[String]) -> Array2<f64> {
        Array2::from_shape_fn((records.len(), feature_names.len()), |(i, j)| {
            records[i].feature(&feature_names[j]).unwrap_or(0.0)
        })
    }
}

/// Seeded permutation importance: accuracy drop on the training partition
/// when one column is shuffled, normalized to sum 1.
fn permutation_importance(
    model: &GradientBoostedClassifier,
    features: &Array2<f64>,
    labels: &[usize],
    feature_names: &[String],
    seed: u64,
) -> Result<HashMap<String, f64>> {
    let baseline = accuracy(labels, &model.predict(features)?);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut drops = Vec::with_capacity(feature_names.len());
    for j in 0..feature_names.len() {
        let mut column: Vec<f64> = features.column(j).to_vec();
        column.shuffle(&mut rng);

        let mut permuted = features.clone();
        for (i, value) in column.into_iter().enumerate() {
            permuted[[i, j]] = value;
        }

        let shuffled_accuracy = accuracy(labels, &model.predict(&permuted)?);
        drops.push((baseline - shuffled_accuracy).max(0.0));
    }

    let total: f64 = drops.iter().sum();
    Ok(feature_names
        .iter()
        .zip(drops)
        .map(|(name, drop)| {
            let weight = if total > 0.0 { drop / total } else { 0.0 };
            (name.clone(), round4(weight))
        })
        .collect())
}

fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn median(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::test_support::synthetic_population;

    #[test]
    fn test_insufficient_data() {
        let population = synthetic_population(9);
        let trainer = ModelTrainer::new(TrainingConfig::default());

        let err = trainer.train(&population).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_train_produces_complete_artifact() {
        let population = synthetic_population(40);
        let trainer = ModelTrainer::new(TrainingConfig {
            n_estimators: 25,
            ..Default::default()
        });

        let artifact = trainer.train(&population).unwrap();

        assert_eq!(artifact.model.n_trees(), 25);
        assert_eq!(
            artifact.metadata.feature_names.len(),
            artifact.scaler.n_features()
        );
        assert_eq!(
            artifact.metadata.training_samples + artifact.metadata.test_samples,
            40
        );
        assert!(artifact.metadata.metrics.accuracy >= 0.0);
        assert!(artifact.metadata.metrics.accuracy <= 1.0);
    }

    #[test]
    fn test_feature_order_is_candidate_order() {
        let population = synthetic_population(20);
        let trainer = ModelTrainer::new(TrainingConfig::default());

        let names = trainer.available_features(&population);
        assert_eq!(
            names,
            vec![
                "StudyHours",
                "Attendance",
                "AssignmentCompletion",
                "Discussions",
                "Resources",
                "StressLevel",
                "Internet",
                "EduTech",
                "OnlineCourses",
                "EngagementScore",
                "RiskScore",
                "Consistency",
            ]
        );
    }

    #[test]
    fn test_imbalanced_target_single_grade() {
        let mut population = synthetic_population(20);
        for record in &mut population {
            record.final_grade = Some(70.0);
        }
        let trainer = ModelTrainer::new(TrainingConfig::default());

        let err = trainer.train(&population).unwrap_err();
        assert_eq!(err.error_code(), "IMBALANCED_TARGET");
    }

    #[test]
    fn test_risk_score_label_fallback() {
        let mut population = synthetic_population(30);
        for record in &mut population {
            record.final_grade = None;
            record.attendance_impact = None;
        }
        let trainer = ModelTrainer::new(TrainingConfig {
            n_estimators: 15,
            ..Default::default()
        });

        // Label falls back to the risk-score median; both classes exist
        // because the population mixes strong and struggling students.
        let artifact = trainer.train(&population).unwrap();
        assert!(artifact.metadata.training_samples > 0);
    }

    #[test]
    fn test_importance_normalized() {
        let population = synthetic_population(40);
        let trainer = ModelTrainer::new(TrainingConfig {
            n_estimators: 25,
            ..Default::default()
        });

        let artifact = trainer.train(&population).unwrap();
        let total: f64 = artifact.metadata.feature_importance.values().sum();
        assert!(total == 0.0 || (total - 1.0).abs() < 0.01);
        assert_eq!(
            artifact.metadata.feature_importance.len(),
            artifact.metadata.feature_names.len()
        );
    }

    #[test]
    fn test_training_is_reproducible() {
        let population = synthetic_population(30);
        let config = TrainingConfig {
            n_estimators: 15,
            ..Default::default()
        };

        let a = ModelTrainer::new(config.clone()).train(&population).unwrap();
        let b = ModelTrainer::new(config).train(&population).unwrap();

        assert_eq!(a.metadata.metrics, b.metadata.metrics);
        assert_eq!(a.metadata.feature_importance, b.metadata.feature_importance);
    }
}
