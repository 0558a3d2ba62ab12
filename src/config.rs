use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model artifact storage configuration
    pub model_store: ModelStoreConfig,

    /// Training hyperparameters
    #[serde(default)]
    pub training: TrainingConfig,

    /// Engagement score weights
    #[serde(default)]
    pub engagement: EngagementWeights,

    /// Risk assessment thresholds
    #[serde(default)]
    pub risk: RiskThresholds,
}

impl EngineConfig {
    /// Load configuration from embedded defaults, file, and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: SSE)
            .add_source(
                config::Environment::with_prefix("SSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_store: ModelStoreConfig::default(),
            training: TrainingConfig::default(),
            engagement: EngagementWeights::default(),
            risk: RiskThresholds::default(),
        }
    }
}

/// Model artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStoreConfig {
    /// Directory holding the persisted model, scaler, and metadata
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
}

impl Default for ModelStoreConfig {
    fn default() -> Self {
        Self {
            dir: default_model_dir(),
        }
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Minimum number of records required for training
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Held-out test fraction for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Number of boosting rounds (weak learners)
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Boosting learning rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Maximum depth of each tree
    #[serde(default = "default_max_depth")]
    pub max_depth: u16,

    /// Random seed for the split and importance shuffles
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_samples: default_min_samples(),
            test_fraction: default_test_fraction(),
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            seed: default_seed(),
        }
    }
}

/// Weights of the 0-100 engagement composite.
/// Fixed design constants, not learned; configurable for tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementWeights {
    #[serde(default = "default_study_hours_weight")]
    pub study_hours_weight: f64,

    #[serde(default = "default_attendance_weight")]
    pub attendance_weight: f64,

    #[serde(default = "default_assignment_weight")]
    pub assignment_weight: f64,

    #[serde(default = "default_discussion_weight")]
    pub discussion_weight: f64,

    #[serde(default = "default_resource_weight")]
    pub resource_weight: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            study_hours_weight: default_study_hours_weight(),
            attendance_weight: default_attendance_weight(),
            assignment_weight: default_assignment_weight(),
            discussion_weight: default_discussion_weight(),
            resource_weight: default_resource_weight(),
        }
    }
}

/// Thresholds for risk triggers, risk levels, and prediction risk bands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Attendance below this triggers a risk factor
    #[serde(default = "default_low_attendance")]
    pub low_attendance: f64,

    /// Engagement score below this triggers a risk factor
    #[serde(default = "default_low_engagement")]
    pub low_engagement: f64,

    /// Stored risk score at or above this triggers a risk factor
    #[serde(default = "default_elevated_risk_score")]
    pub elevated_risk_score: f64,

    /// Completion likelihood below this triggers a risk factor
    #[serde(default = "default_low_completion_likelihood")]
    pub low_completion_likelihood: f64,

    /// Risk score at or above this forces the critical level
    #[serde(default = "default_critical_risk_score")]
    pub critical_risk_score: f64,

    /// Risk score at or above this forces the high level
    #[serde(default = "default_high_risk_score")]
    pub high_risk_score: f64,

    /// Risk score at or above this forces the medium level
    #[serde(default = "default_medium_risk_score")]
    pub medium_risk_score: f64,

    /// Completion likelihood at or above this maps to the low prediction band
    #[serde(default = "default_low_band_likelihood")]
    pub low_band_likelihood: f64,

    /// Completion likelihood at or above this maps to the medium prediction band
    #[serde(default = "default_medium_band_likelihood")]
    pub medium_band_likelihood: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_attendance: default_low_attendance(),
            low_engagement: default_low_engagement(),
            elevated_risk_score: default_elevated_risk_score(),
            low_completion_likelihood: default_low_completion_likelihood(),
            critical_risk_score: default_critical_risk_score(),
            high_risk_score: default_high_risk_score(),
            medium_risk_score: default_medium_risk_score(),
            low_band_likelihood: default_low_band_likelihood(),
            medium_band_likelihood: default_medium_band_likelihood(),
        }
    }
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("./data/models")
}

fn default_min_samples() -> usize {
    10
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_n_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> u16 {
    5
}

fn default_seed() -> u64 {
    42
}

fn default_study_hours_weight() -> f64 {
    30.0
}

fn default_attendance_weight() -> f64 {
    20.0
}

fn default_assignment_weight() -> f64 {
    20.0
}

fn default_discussion_weight() -> f64 {
    20.0
}

fn default_resource_weight() -> f64 {
    10.0
}

fn default_low_attendance() -> f64 {
    50.0
}

fn default_low_engagement() -> f64 {
    30.0
}

fn default_elevated_risk_score() -> f64 {
    70.0
}

fn default_low_completion_likelihood() -> f64 {
    40.0
}

fn default_critical_risk_score() -> f64 {
    80.0
}

fn default_high_risk_score() -> f64 {
    70.0
}

fn default_medium_risk_score() -> f64 {
    50.0
}

fn default_low_band_likelihood() -> f64 {
    70.0
}

fn default_medium_band_likelihood() -> f64 {
    50.0
}
