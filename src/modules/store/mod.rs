//! Job persistence.
//!
//! The store belongs to the host application; the pipeline only reads a
//! posting's URL and writes back the fields listed on [`JobUpdate`].

mod memory;
mod posting;
mod redb_store;

pub use memory::InMemoryJobStore;
pub use posting::{JobPosting, JobStatus, JobUpdate};
pub use redb_store::RedbJobStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(String),
    #[error("failed to (de)serialize job record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] redb::Error),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence seam for job postings.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<JobPosting>, StoreError>;

    async fn insert(&self, posting: JobPosting) -> Result<(), StoreError>;

    /// Merge `update` into the stored posting and return the result.
    async fn update(&self, id: &str, update: JobUpdate) -> Result<JobPosting, StoreError>;
}
