use crate::error::Result;
use crate::models::FeatureRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Record-lookup collaborator. The engine only ever reads from it: the
/// trainer needs the full population and batch prediction needs per-id
/// lookups.
#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Get a student record by ID
    async fn get_student(&self, student_id: &str) -> Result<Option<FeatureRecord>>;

    /// List all student records, ordered by student ID
    async fn list_students(&self) -> Result<Vec<FeatureRecord>>;

    /// Count student records
    async fn count_students(&self) -> Result<u64>;
}

/// In-memory student store (for embedding and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    students: Arc<DashMap<String, FeatureRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            students: Arc::new(DashMap::new()),
        }
    }

    /// Seed the store with a derived population. Replaces records sharing
    /// the same student ID.
    pub fn insert_students(&self, records: Vec<FeatureRecord>) {
        for record in records {
            self.students.insert(record.student_id.clone(), record);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentStore for InMemoryStore {
    async fn get_student(&self, student_id: &str) -> Result<Option<FeatureRecord>> {
        Ok(self.students.get(student_id).map(|entry| entry.clone()))
    }

    async fn list_students(&self) -> Result<Vec<FeatureRecord>> {
        let mut students: Vec<FeatureRecord> = self
            .students
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        // Stable population order for reproducible training runs.
        students.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        Ok(students)
    }

    async fn count_students(&self) -> Result<u64> {
        Ok(self.students.len() as u64)
    }
}
