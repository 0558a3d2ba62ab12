pub mod student;

pub use student::{
    names, BatchPredictionEntry, FeatureRecord, PredictionResult, RiskAssessment, RiskBand,
    RiskLevel, StudentRecord,
};
