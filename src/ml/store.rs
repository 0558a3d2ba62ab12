use crate::error::{AppError, Result};
use crate::ml::boosting::GradientBoostedClassifier;
use crate::ml::models::{TrainedArtifact, TrainingMetadata};
use crate::ml::scaler::StandardScaler;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Model artifact file name
pub const MODEL_FILE: &str = "completion_model.bin";

/// Scaler artifact file name
pub const SCALER_FILE: &str = "scaler.bin";

/// Metadata artifact file name
pub const METADATA_FILE: &str = "model_info.json";

/// Filesystem store for the persisted (model, scaler, metadata) triple.
///
/// Holds at most one artifact generation; a successful save is a full
/// replacement. Files are staged to temporaries and renamed into place so a
/// reader never observes a half-written generation.
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a complete artifact generation, replacing any previous one.
    pub fn save(&self, artifact: &TrainedArtifact) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let model_bytes = bincode::serialize(&artifact.model)?;
        let scaler_bytes = bincode::serialize(&artifact.scaler)?;
        let metadata_bytes = serde_json::to_vec_pretty(&artifact.metadata)?;

        // Stage all three before renaming any, so a failure mid-save leaves
        // the previous generation intact.
        let staged = [
            self.stage(MODEL_FILE, &model_bytes)?,
            self.stage(SCALER_FILE, &scaler_bytes)?,
            self.stage(METADATA_FILE, &metadata_bytes)?,
        ];

        for (tmp, name) in staged.iter().zip([MODEL_FILE, SCALER_FILE, METADATA_FILE]) {
            fs::rename(tmp, self.dir.join(name))?;
        }

        debug!(dir = %self.dir.display(), "Model artifact saved");
        Ok(())
    }

    /// Load the persisted artifact, or `None` when the store is untrained.
    ///
    /// Partial presence reads as untrained: a model without its fitted
    /// scaler (or without metadata) must never be served, since scaling and
    /// weights are positional and co-versioned.
    pub fn load(&self) -> Result<Option<TrainedArtifact>> {
        let model_path = self.dir.join(MODEL_FILE);
        let scaler_path = self.dir.join(SCALER_FILE);
        let metadata_path = self.dir.join(METADATA_FILE);

        let present = [&model_path, &scaler_path, &metadata_path]
            .iter()
            .filter(|p| p.exists())
            .count();

        if present == 0 {
            return Ok(None);
        }
        if present < 3 {
            warn!(
                dir = %self.dir.display(),
                "Partial model artifact on disk; treating store as untrained"
            );
            return Ok(None);
        }

        let model: GradientBoostedClassifier = bincode::deserialize(&fs::read(&model_path)?)?;
        let scaler: StandardScaler = bincode::deserialize(&fs::read(&scaler_path)?)?;
        let metadata: TrainingMetadata = serde_json::from_slice(&fs::read(&metadata_path)?)?;

        if scaler.n_features() != metadata.feature_names.len()
            || model.n_features() != metadata.feature_names.len()
        {
            return Err(AppError::Serialization(format!(
                "artifact feature widths disagree (model {}, scaler {}, metadata {})",
                model.n_features(),
                scaler.n_features(),
                metadata.feature_names.len()
            )));
        }

        debug!(dir = %self.dir.display(), "Model artifact loaded");
        Ok(Some(TrainedArtifact {
            model,
            scaler,
            metadata,
        }))
    }

    fn stage(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let tmp = self.dir.join(format!("{}.tmp", name));
        fs::write(&tmp, bytes)?;
        Ok(tmp)
    }
}
