use crate::config::RiskThresholds;
use crate::error::Result;
use crate::ml::models::TrainedArtifact;
use crate::ml::predictor::Predictor;
use crate::models::{FeatureRecord, RiskAssessment, RiskLevel};

/// Rule-based dropout-risk assessment blending model output with
/// threshold triggers. Predictor failures propagate unmodified.
pub struct RiskAssessor {
    thresholds: RiskThresholds,
    predictor: Predictor,
}

impl RiskAssessor {
    pub fn new(thresholds: RiskThresholds) -> Self {
        let predictor = Predictor::new(thresholds.clone());
        Self {
            thresholds,
            predictor,
        }
    }

    /// Assess one student against the four independent risk triggers and
    /// the first-match level decision table.
    pub fn assess(
        &self,
        artifact: &TrainedArtifact,
        record: &FeatureRecord,
    ) -> Result<RiskAssessment> {
        let prediction = self.predictor.predict(artifact, record)?;

        let attendance = record.attendance.unwrap_or(0.0);
        let engagement = record.engagement_score;
        let risk_score = record.risk_score;

        let mut risk_factors = Vec::new();
        if attendance < self.thresholds.low_attendance {
            risk_factors.push("Very low attendance".to_string());
        }
        if engagement < self.thresholds.low_engagement {
            risk_factors.push("Very low engagement".to_string());
        }
        if risk_score >= self.thresholds.elevated_risk_score {
            risk_factors.push("High risk score".to_string());
        }
        if prediction.completion_likelihood < self.thresholds.low_completion_likelihood {
            risk_factors.push("Low completion likelihood".to_string());
        }

        let risk_level = self.level(risk_factors.len(), risk_score);

        Ok(RiskAssessment {
            student_id: record.student_id.clone(),
            risk_level,
            risk_score: round2(risk_score),
            completion_likelihood: prediction.completion_likelihood,
            risk_factors,
            recommendations: recommendations(risk_level),
        })
    }

    /// First match wins, evaluated top-down.
    fn level(&self, triggers: usize, risk_score: f64) -> RiskLevel {
        if triggers >= 3 || risk_score >= self.thresholds.critical_risk_score {
            RiskLevel::Critical
        } else if triggers >= 2 || risk_score >= self.thresholds.high_risk_score {
            RiskLevel::High
        } else if triggers >= 1 || risk_score >= self.thresholds.medium_risk_score {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Fixed, level-keyed action strings; no randomness, no model involvement.
fn recommendations(level: RiskLevel) -> Vec<String> {
    let actions: &[&str] = match level {
        RiskLevel::Critical => &[
            "Immediate intervention required",
            "Schedule one-on-one meeting",
            "Provide additional support resources",
        ],
        RiskLevel::High => &[
            "Close monitoring recommended",
            "Increase engagement activities",
            "Provide academic support",
        ],
        RiskLevel::Medium => &[
            "Regular check-ins recommended",
            "Encourage participation",
        ],
        RiskLevel::Low => &["Continue current support level"],
    };
    actions.iter().map(|s| s.to_string()).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::ml::test_support::synthetic_population;
    use crate::ml::trainer::ModelTrainer;

    fn trained() -> (TrainedArtifact, Vec<FeatureRecord>) {
        let population = synthetic_population(40);
        let artifact = ModelTrainer::new(TrainingConfig {
            n_estimators: 25,
            ..Default::default()
        })
        .train(&population)
        .unwrap();
        (artifact, population)
    }

    #[test]
    fn test_strong_student_is_low_risk() {
        let (artifact, population) = trained();
        let assessor = RiskAssessor::new(RiskThresholds::default());

        let assessment = assessor.assess(&artifact, &population[0]).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.risk_factors.is_empty());
        assert_eq!(
            assessment.recommendations,
            vec!["Continue current support level"]
        );
    }

    #[test]
    fn test_struggling_student_collects_triggers() {
        let (artifact, population) = trained();
        let assessor = RiskAssessor::new(RiskThresholds::default());

        // Index 1 is a struggling student: low attendance, low engagement,
        // high stress.
        let assessment = assessor.assess(&artifact, &population[1]).unwrap();
        assert!(assessment.risk_factors.len() >= 2);
        assert!(assessment.risk_level >= RiskLevel::High);
        assert!(!assessment.recommendations.is_empty());
    }

    #[test]
    fn test_level_decision_table() {
        let assessor = RiskAssessor::new(RiskThresholds::default());

        assert_eq!(assessor.level(3, 0.0), RiskLevel::Critical);
        assert_eq!(assessor.level(0, 85.0), RiskLevel::Critical);
        assert_eq!(assessor.level(2, 0.0), RiskLevel::High);
        assert_eq!(assessor.level(0, 72.0), RiskLevel::High);
        assert_eq!(assessor.level(1, 0.0), RiskLevel::Medium);
        assert_eq!(assessor.level(0, 55.0), RiskLevel::Medium);
        assert_eq!(assessor.level(0, 20.0), RiskLevel::Low);
    }

    #[test]
    fn test_risk_factor_labels_in_trigger_order() {
        let (artifact, mut population) = trained();
        let assessor = RiskAssessor::new(RiskThresholds::default());

        let mut record = population.remove(1);
        record.attendance = Some(10.0);
        record.engagement_score = 5.0;
        record.risk_score = 95.0;

        let assessment = assessor.assess(&artifact, &record).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
        assert_eq!(assessment.risk_factors[0], "Very low attendance");
        assert_eq!(assessment.risk_factors[1], "Very low engagement");
        assert_eq!(assessment.risk_factors[2], "High risk score");
    }
}
