//! Embedded `redb` store keeping one JSON document per job.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableTable, TableDefinition};

use super::{JobPosting, JobStore, JobUpdate, StoreError};

const JOBS: TableDefinition<&str, &str> = TableDefinition::new("jobs");

#[derive(Clone)]
pub struct RedbJobStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbJobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbJobStore").finish_non_exhaustive()
    }
}

fn db_err(err: impl Into<redb::Error>) -> StoreError {
    StoreError::Database(err.into())
}

impl RedbJobStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(db_err)?;

        let txn = db.begin_write().map_err(db_err)?;
        txn.open_table(JOBS).map_err(db_err)?;
        txn.commit().map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read(db: &Database, id: &str) -> Result<Option<JobPosting>, StoreError> {
        let txn = db.begin_read().map_err(db_err)?;
        let table = txn.open_table(JOBS).map_err(db_err)?;
        let Some(raw) = table.get(id).map_err(db_err)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(raw.value())?))
    }

    fn write(db: &Database, posting: &JobPosting) -> Result<(), StoreError> {
        let json = serde_json::to_string(posting)?;
        let txn = db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(JOBS).map_err(db_err)?;
            table.insert(posting.id.as_str(), json.as_str()).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(db.as_ref()))
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?
    }
}

#[async_trait]
impl JobStore for RedbJobStore {
    async fn get(&self, id: &str) -> Result<Option<JobPosting>, StoreError> {
        let id = id.to_string();
        self.blocking(move |db| Self::read(db, &id)).await
    }

    async fn insert(&self, posting: JobPosting) -> Result<(), StoreError> {
        self.blocking(move |db| Self::write(db, &posting)).await
    }

    async fn update(&self, id: &str, update: JobUpdate) -> Result<JobPosting, StoreError> {
        let id = id.to_string();
        self.blocking(move |db| {
            let mut posting =
                Self::read(db, &id)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;
            posting.apply(update, Utc::now());
            Self::write(db, &posting)?;
            Ok(posting)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::store::JobStatus;

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.redb");

        {
            let store = RedbJobStore::open(&path).unwrap();
            store
                .insert(JobPosting::new("42", Some("https://example.com/jobs/42".into())))
                .await
                .unwrap();
            let updated = store
                .update(
                    "42",
                    JobUpdate {
                        status: Some(JobStatus::NoResponse),
                        description: Some("Build the thing".into()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.status, JobStatus::NoResponse);
        }

        let store = RedbJobStore::open(&path).unwrap();
        let posting = store.get("42").await.unwrap().expect("stored");
        assert_eq!(posting.description.as_deref(), Some("Build the thing"));
        assert!(store.get("43").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_unknown_job_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbJobStore::open(dir.path().join("jobs.redb")).unwrap();
        let err = store.update("nope", JobUpdate::failed()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
