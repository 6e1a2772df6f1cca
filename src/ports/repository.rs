use crate::domain::error::PersistenceError;
use crate::domain::jobs::VideoRecord;
use async_trait::async_trait;

/// Store of completed videos. Implementations serialize their own writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Record a finished output. Called at most once per job.
    async fn record_completed(
        &self,
        job_id: &str,
        filename: &str,
        owner_id: u64,
    ) -> Result<VideoRecord, PersistenceError>;

    async fn find_by_job(&self, job_id: &str) -> Result<Option<VideoRecord>, PersistenceError>;

    async fn list_for_owner(&self, owner_id: u64) -> Result<Vec<VideoRecord>, PersistenceError>;

    /// Remove a record owned by `owner_id`, returning it so the caller can delete the file.
    async fn delete(&self, id: u64, owner_id: u64) -> Result<VideoRecord, PersistenceError>;
}
