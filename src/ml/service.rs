use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::ml::models::{TrainedArtifact, TrainingMetadata};
use crate::ml::predictor::Predictor;
use crate::ml::risk::RiskAssessor;
use crate::ml::store::ModelStore;
use crate::ml::trainer::ModelTrainer;
use crate::models::{BatchPredictionEntry, FeatureRecord, PredictionResult, RiskAssessment};
use crate::state::StudentStore;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Orchestrating façade over the model lifecycle.
///
/// Single-writer, multiple-reader: one training run may be in flight at a
/// time, while any number of prediction and assessment calls run against an
/// immutable `Arc<TrainedArtifact>` snapshot. The snapshot is swapped only
/// after the new generation is fully persisted, so readers see either the
/// old complete artifact or the new complete one.
pub struct MlService {
    config: EngineConfig,
    model_store: ModelStore,
    student_store: Arc<dyn StudentStore>,
    artifact: RwLock<Option<Arc<TrainedArtifact>>>,
    training_lock: Mutex<()>,
    predictor: Predictor,
    assessor: RiskAssessor,
}

impl MlService {
    pub fn new(config: EngineConfig, student_store: Arc<dyn StudentStore>) -> Self {
        let model_store = ModelStore::new(config.model_store.dir.clone());
        let predictor = Predictor::new(config.risk.clone());
        let assessor = RiskAssessor::new(config.risk.clone());

        Self {
            config,
            model_store,
            student_store,
            artifact: RwLock::new(None),
            training_lock: Mutex::new(()),
            predictor,
            assessor,
        }
    }

    /// Train on the full current population and atomically replace the
    /// persisted artifact and the in-process snapshot.
    pub async fn train(&self) -> Result<TrainingMetadata> {
        // Exactly one training run in flight; readers are not blocked.
        let _guard = self.training_lock.lock().await;

        let population = self.student_store.list_students().await?;
        info!(population = population.len(), "Starting training run");

        let trainer = ModelTrainer::new(self.config.training.clone());
        let artifact = trainer.train(&population)?;

        // Persist before publishing: a crash between these two steps leaves
        // readers on the old snapshot and the store on the new generation,
        // both complete.
        self.model_store.save(&artifact)?;

        let metadata = artifact.metadata.clone();
        *self.artifact.write().await = Some(Arc::new(artifact));

        info!(
            accuracy = metadata.metrics.accuracy,
            features = metadata.feature_names.len(),
            "Training run completed"
        );
        Ok(metadata)
    }

    /// Predict completion for one student; fails with `ModelUnavailable`
    /// when no artifact exists. Never triggers training.
    pub async fn predict(&self, student_id: &str) -> Result<PredictionResult> {
        let record = self.lookup(student_id).await?;
        let artifact = self.snapshot().await?;
        self.predictor.predict(&artifact, &record)
    }

    /// Predict completion, training first when no artifact exists.
    ///
    /// The retrain fallback is an explicit caller-selected mode rather than
    /// a hidden side effect of `predict`.
    pub async fn predict_or_train(&self, student_id: &str) -> Result<PredictionResult> {
        let record = self.lookup(student_id).await?;

        let artifact = match self.snapshot().await {
            Ok(artifact) => artifact,
            Err(AppError::ModelUnavailable(_)) => {
                warn!("No trained model available; training before predicting");
                self.train().await?;
                self.snapshot().await?
            }
            Err(e) => return Err(e),
        };

        self.predictor.predict(&artifact, &record)
    }

    /// Predict for a list of student IDs. A lookup miss yields a per-item
    /// fault entry; partial success is the normal case.
    pub async fn predict_batch(&self, student_ids: &[String]) -> Vec<BatchPredictionEntry> {
        let mut entries = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            match self.predict(student_id).await {
                Ok(prediction) => entries.push(BatchPredictionEntry::Prediction(prediction)),
                Err(e) => {
                    debug!(student_id = %student_id, kind = e.error_code(), "Batch entry failed");
                    entries.push(BatchPredictionEntry::Fault {
                        student_id: student_id.clone(),
                        fault: e.fault(),
                    });
                }
            }
        }
        entries
    }

    /// Assess dropout risk for one student.
    pub async fn assess_risk(&self, student_id: &str) -> Result<RiskAssessment> {
        let record = self.lookup(student_id).await?;
        let artifact = self.snapshot().await?;
        self.assessor.assess(&artifact, &record)
    }

    /// Metadata of the last trained generation, or `None` when untrained.
    pub async fn model_info(&self) -> Result<Option<TrainingMetadata>> {
        match self.snapshot().await {
            Ok(artifact) => Ok(Some(artifact.metadata.clone())),
            Err(AppError::ModelUnavailable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Current artifact snapshot, loading from the store on a cold start.
    async fn snapshot(&self) -> Result<Arc<TrainedArtifact>> {
        if let Some(artifact) = self.artifact.read().await.as_ref() {
            return Ok(artifact.clone());
        }

        let loaded = self.model_store.load()?.ok_or_else(|| {
            AppError::ModelUnavailable("no persisted artifact; train the model first".to_string())
        })?;

        debug!("Loaded persisted model artifact into memory");
        let loaded = Arc::new(loaded);

        let mut guard = self.artifact.write().await;
        // A concurrent loader or trainer may have published first.
        if let Some(existing) = guard.as_ref() {
            return Ok(existing.clone());
        }
        *guard = Some(loaded.clone());
        Ok(loaded)
    }

    async fn lookup(&self, student_id: &str) -> Result<FeatureRecord> {
        self.student_store
            .get_student(student_id)
            .await?
            .ok_or_else(|| AppError::StudentNotFound(student_id.to_string()))
    }
}
