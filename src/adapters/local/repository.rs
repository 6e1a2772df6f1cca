//! JSON-file VideoRepository implementation.

use crate::domain::error::PersistenceError;
use crate::domain::jobs::VideoRecord;
use crate::ports::repository::VideoRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const STORE_FILE: &str = "videos.json";

/// Every record lives in one JSON array, rewritten atomically on each change.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    records: Mutex<Vec<VideoRecord>>,
}

impl JsonFileRepository {
    /// Open (or start) the store inside `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(STORE_FILE);

        let records = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn persist(&self, records: &[VideoRecord]) -> Result<(), PersistenceError> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for JsonFileRepository {
    async fn record_completed(
        &self,
        job_id: &str,
        filename: &str,
        owner_id: u64,
    ) -> Result<VideoRecord, PersistenceError> {
        let mut records = self.records.lock().await;
        let record = VideoRecord {
            id: records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            job_id: job_id.to_string(),
            filename: filename.to_string(),
            owner_id,
            created_at: Utc::now(),
        };

        records.push(record.clone());
        if let Err(e) = self.persist(&records).await {
            records.pop();
            return Err(e);
        }

        tracing::info!(job_id, video_id = record.id, owner_id, "video recorded");
        Ok(record)
    }

    async fn find_by_job(&self, job_id: &str) -> Result<Option<VideoRecord>, PersistenceError> {
        let records = self.records.lock().await;
        Ok(records.iter().find(|r| r.job_id == job_id).cloned())
    }

    async fn list_for_owner(&self, owner_id: u64) -> Result<Vec<VideoRecord>, PersistenceError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: u64, owner_id: u64) -> Result<VideoRecord, PersistenceError> {
        let mut records = self.records.lock().await;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(PersistenceError::NotFound(id))?;
        if records[index].owner_id != owner_id {
            return Err(PersistenceError::Forbidden(id));
        }

        let removed = records.remove(index);
        if let Err(e) = self.persist(&records).await {
            records.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_record_and_find_by_job() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();

        let rec = repo
            .record_completed("1700000000", "trimmed_1700000000_clip.mp4", 7)
            .await
            .unwrap();
        assert_eq!(rec.id, 1);

        let found = repo.find_by_job("1700000000").await.unwrap().unwrap();
        assert_eq!(found.filename, "trimmed_1700000000_clip.mp4");
        assert!(repo.find_by_job("1700000001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let repo = JsonFileRepository::open(dir.path()).await.unwrap();
            repo.record_completed("a", "trimmed_a_x.mp4", 1).await.unwrap();
            repo.record_completed("b", "trimmed_b_x.mp4", 2).await.unwrap();
        }

        let repo = JsonFileRepository::open(dir.path()).await.unwrap();
        let mine = repo.list_for_owner(2).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].job_id, "b");
        assert_eq!(mine[0].id, 2);
    }

    #[tokio::test]
    async fn test_delete_checks_owner() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::open(dir.path()).await.unwrap();
        let rec = repo.record_completed("a", "trimmed_a_x.mp4", 1).await.unwrap();

        assert!(matches!(
            repo.delete(rec.id, 2).await,
            Err(PersistenceError::Forbidden(_))
        ));
        assert!(matches!(
            repo.delete(99, 1).await,
            Err(PersistenceError::NotFound(99))
        ));
        assert_eq!(repo.delete(rec.id, 1).await.unwrap().job_id, "a");
        assert!(repo.list_for_owner(1).await.unwrap().is_empty());
    }
}
