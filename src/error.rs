use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Source batch missing or unreadable; fatal to that run, no partial output
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Training population too small
    #[error("Insufficient data for training: {0}")]
    InsufficientData(String),

    /// Neither label source (FinalGrade, RiskScore) present in the population
    #[error("No target variable: {0}")]
    NoTargetVariable(String),

    /// Label has a single class; training requires both outcomes observed
    #[error("Imbalanced target variable: {0}")]
    ImbalancedTarget(String),

    /// No usable persisted artifact and no training fallback succeeded
    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    /// Record lookup miss; per-item in batch operations, non-fatal to the batch
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get machine-readable error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::DataUnavailable(_) => "DATA_UNAVAILABLE",
            AppError::InsufficientData(_) => "INSUFFICIENT_DATA",
            AppError::NoTargetVariable(_) => "NO_TARGET_VARIABLE",
            AppError::ImbalancedTarget(_) => "IMBALANCED_TARGET",
            AppError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            AppError::StudentNotFound(_) => "STUDENT_NOT_FOUND",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to a transport-agnostic structured fault object
    pub fn fault(&self) -> FaultInfo {
        FaultInfo {
            kind: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Structured fault returned to callers instead of a raised error,
/// e.g. as per-item entries in batch predictions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaultInfo {
    /// Machine-readable kind
    pub kind: String,

    /// Human-readable message
    pub message: String,
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
