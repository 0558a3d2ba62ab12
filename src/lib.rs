//! Student course-completion prediction engine.
//!
//! Raw student records flow through a deterministic pipeline (deduplication,
//! imputation, feature derivation), feed a gradient-boosted completion
//! classifier, and come back out as completion predictions and rule-based
//! dropout-risk assessments. The trained model, its fitted scaler, and the
//! training metadata persist together as one co-versioned artifact.

pub mod config;
pub mod error;
pub mod ml;
pub mod models;
pub mod pipeline;
pub mod state;

pub use config::EngineConfig;
pub use error::{AppError, Result};
pub use ml::MlService;
