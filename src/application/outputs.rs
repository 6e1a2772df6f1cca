//! Lookup of finished outputs by job id, and per-owner listing/deletion.

use crate::domain::av::cmd::MediaTool;
use crate::domain::av::probe::media_duration;
use crate::domain::error::PersistenceError;
use crate::domain::jobs::VideoRecord;
use crate::ports::progress::ProgressStore;
use crate::ports::repository::VideoRepository;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputInfo {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedVideo {
    #[serde(flatten)]
    pub record: VideoRecord,
    pub file_size: u64,
}

pub struct OutputCatalog {
    repo: Arc<dyn VideoRepository>,
    progress: Arc<dyn ProgressStore>,
    tool: Arc<dyn MediaTool>,
    output_dir: PathBuf,
}

impl OutputCatalog {
    pub fn new(
        repo: Arc<dyn VideoRepository>,
        progress: Arc<dyn ProgressStore>,
        tool: Arc<dyn MediaTool>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            repo,
            progress,
            tool,
            output_dir,
        }
    }

    /// Path of the output produced by `job_id`, if it exists on disk.
    ///
    /// The recorded filename wins. Outputs written before records carried a job
    /// id are found by their `trimmed_{job_id}_` prefix, but only when exactly
    /// one file matches and the id is not one of this process's unrecorded jobs.
    pub async fn locate(&self, job_id: &str) -> Result<Option<PathBuf>, PersistenceError> {
        if let Some(record) = self.repo.find_by_job(job_id).await? {
            let path = self.output_dir.join(&record.filename);
            return Ok(fs::try_exists(&path).await?.then_some(path));
        }
        // Still running or failed: whatever is on disk is partial.
        if let Some(progress) = self.progress.find(job_id) {
            tracing::debug!(job_id, progress = progress.as_i32(), "output not recorded");
            return Ok(None);
        }
        Ok(self.scan_by_prefix(job_id).await?)
    }

    async fn scan_by_prefix(&self, job_id: &str) -> io::Result<Option<PathBuf>> {
        let prefix = format!("trimmed_{}_", job_id);
        let mut entries = match fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                matches.push(entry.path());
            }
        }

        match matches.len() {
            1 => Ok(matches.pop()),
            0 => Ok(None),
            n => {
                tracing::warn!(job_id, candidates = n, "ambiguous output lookup");
                Ok(None)
            }
        }
    }

    /// Size of the output, plus its duration when ffprobe can read it.
    pub async fn info(&self, job_id: &str) -> Result<Option<OutputInfo>, PersistenceError> {
        let Some(path) = self.locate(job_id).await? else {
            return Ok(None);
        };
        let size = fs::metadata(&path).await?.len();
        let duration = match media_duration(self.tool.as_ref(), &path).await {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::debug!(job_id, error = %e, "duration probe failed");
                None
            }
        };
        Ok(Some(OutputInfo { size, duration }))
    }

    pub async fn list_for_owner(&self, owner_id: u64) -> Result<Vec<OwnedVideo>, PersistenceError> {
        let records = self.repo.list_for_owner(owner_id).await?;
        let mut videos = Vec::with_capacity(records.len());
        for record in records {
            let file_size = file_size(&self.output_dir.join(&record.filename)).await;
            videos.push(OwnedVideo { record, file_size });
        }
        Ok(videos)
    }

    /// Delete an owner's video record and its file.
    pub async fn delete(&self, id: u64, owner_id: u64) -> Result<VideoRecord, PersistenceError> {
        let record = self.repo.delete(id, owner_id).await?;
        let path = self.output_dir.join(&record.filename);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(video_id = id, owner_id, "video deleted");
        Ok(record)
    }
}

async fn file_size(path: &Path) -> u64 {
    fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::progress::InMemoryProgress;
    use crate::adapters::local::repository::JsonFileRepository;
    use crate::domain::av::cmd::test_support::{output_with, success};
    use crate::domain::av::cmd::MockMediaTool;
    use crate::domain::jobs::Progress;
    use tempfile::{tempdir, TempDir};

    async fn catalog(tool: MockMediaTool) -> (TempDir, Arc<JsonFileRepository>, OutputCatalog) {
        let (root, repo, _progress, catalog) = catalog_with_progress(tool).await;
        (root, repo, catalog)
    }

    async fn catalog_with_progress(
        tool: MockMediaTool,
    ) -> (TempDir, Arc<JsonFileRepository>, Arc<InMemoryProgress>, OutputCatalog) {
        let root = tempdir().unwrap();
        let output_dir = root.path().join("outputs");
        std::fs::create_dir_all(&output_dir).unwrap();
        let repo = Arc::new(
            JsonFileRepository::open(&root.path().join("data"))
                .await
                .unwrap(),
        );
        let progress = Arc::new(InMemoryProgress::new());
        let catalog =
            OutputCatalog::new(repo.clone(), progress.clone(), Arc::new(tool), output_dir);
        (root, repo, progress, catalog)
    }

    #[tokio::test]
    async fn test_locate_uses_recorded_filename() {
        let (root, repo, catalog) = catalog(MockMediaTool::new()).await;
        let out = root.path().join("outputs/trimmed_1700000000_clip.mp4");
        std::fs::write(&out, b"video").unwrap();
        repo.record_completed("1700000000", "trimmed_1700000000_clip.mp4", 1)
            .await
            .unwrap();

        assert_eq!(catalog.locate("1700000000").await.unwrap(), Some(out));
        assert_eq!(catalog.locate("1700000001").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_locate_falls_back_to_unique_prefix() {
        let (root, _repo, catalog) = catalog(MockMediaTool::new()).await;
        let out = root.path().join("outputs/trimmed_1600000000_old.mkv");
        std::fs::write(&out, b"video").unwrap();
        std::fs::write(root.path().join("outputs/trimmed_1600000001_a.mp4"), b"x").unwrap();
        std::fs::write(root.path().join("outputs/trimmed_1600000001_b.mp4"), b"x").unwrap();

        assert_eq!(catalog.locate("1600000000").await.unwrap(), Some(out));
        assert_eq!(catalog.locate("1600000001").await.unwrap(), None);
        assert_eq!(catalog.locate("160000000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unrecorded_job_output_is_hidden() {
        let (root, repo, progress, catalog) = catalog_with_progress(MockMediaTool::new()).await;
        let partial = root.path().join("outputs/trimmed_1700000000_clip.mp4");
        std::fs::write(&partial, b"half written").unwrap();

        progress.try_register("1700000000");
        progress.update("1700000000", Progress::Running(95));
        assert_eq!(catalog.locate("1700000000").await.unwrap(), None);
        assert!(catalog.info("1700000000").await.unwrap().is_none());

        progress.update("1700000000", Progress::Failed);
        assert_eq!(catalog.locate("1700000000").await.unwrap(), None);

        repo.record_completed("1700000000", "trimmed_1700000000_clip.mp4", 1)
            .await
            .unwrap();
        assert_eq!(catalog.locate("1700000000").await.unwrap(), Some(partial));
    }

    #[tokio::test]
    async fn test_info_reports_size_and_duration() {
        let mut tool = MockMediaTool::new();
        tool.expect_probe_duration().returning(|_| {
            let mut out = success();
            out.stdout = b"4.5\n".to_vec();
            Ok(out)
        });
        let (root, repo, catalog) = catalog(tool).await;
        std::fs::write(root.path().join("outputs/trimmed_9_a.mp4"), b"12345").unwrap();
        repo.record_completed("9", "trimmed_9_a.mp4", 1).await.unwrap();

        let info = catalog.info("9").await.unwrap().unwrap();
        assert_eq!(info, OutputInfo { size: 5, duration: Some(4.5) });
    }

    #[tokio::test]
    async fn test_info_without_probe() {
        let mut tool = MockMediaTool::new();
        tool.expect_probe_duration()
            .returning(|_| Ok(output_with(1, "Invalid data")));
        let (root, _repo, catalog) = catalog(tool).await;
        std::fs::write(root.path().join("outputs/trimmed_9_a.mp4"), b"12").unwrap();

        let info = catalog.info("9").await.unwrap().unwrap();
        assert_eq!(info, OutputInfo { size: 2, duration: None });
        assert!(catalog.info("10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (root, repo, catalog) = catalog(MockMediaTool::new()).await;
        let out = root.path().join("outputs/trimmed_1_a.mp4");
        std::fs::write(&out, b"abc").unwrap();
        let rec = repo.record_completed("1", "trimmed_1_a.mp4", 5).await.unwrap();
        repo.record_completed("2", "trimmed_2_gone.mp4", 5).await.unwrap();

        let videos = catalog.list_for_owner(5).await.unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].file_size, 3);
        assert_eq!(videos[1].file_size, 0);

        assert!(matches!(
            catalog.delete(rec.id, 6).await,
            Err(PersistenceError::Forbidden(_))
        ));
        assert!(out.exists());
        catalog.delete(rec.id, 5).await.unwrap();
        assert!(!out.exists());
    }
}
