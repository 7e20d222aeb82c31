//! `HashMap`-backed [`JobStore`](super::JobStore) living in process memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{JobPosting, JobStore, JobUpdate, StoreError};

/// Process-local store, used for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, JobPosting>>,
    writes: AtomicUsize,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: impl IntoIterator<Item = JobPosting>) -> Self {
        Self {
            jobs: RwLock::new(jobs.into_iter().map(|job| (job.id.clone(), job)).collect()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `update` calls that reached a stored posting.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, id: &str) -> Result<Option<JobPosting>, StoreError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn insert(&self, posting: JobPosting) -> Result<(), StoreError> {
        self.jobs.write().await.insert(posting.id.clone(), posting);
        Ok(())
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<JobPosting, StoreError> {
        let mut jobs = self.jobs.write().await;
        let posting = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        posting.apply(update, Utc::now());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(posting.clone())
    }
}
