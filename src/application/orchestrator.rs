use crate::domain::av::cmd::MediaTool;
use crate::domain::av::concat::{concat_segments, write_manifest};
use crate::domain::av::segments::{extract_segment, segment_path};
use crate::domain::error::{CleanupError, JobError, SubmitError, ValidationError};
use crate::domain::jobs::{
    extraction_progress, output_filename, Progress, TimeSegment, TrimJob, COMPLETE,
    CONCAT_STARTED,
};
use crate::ports::progress::ProgressStore;
use crate::ports::queue::{JobQueuePort, QueueError};
use crate::ports::repository::VideoRepository;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;
use tokio_util::sync::CancellationToken;

/// Source containers accepted for trimming.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Where finished outputs and per-job working directories go.
#[derive(Debug, Clone)]
pub struct JobDirs {
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
}

pub fn allowed_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Checks done before a job exists.
pub fn validate_request(source: &Path, segments: &[TimeSegment]) -> Result<(), ValidationError> {
    if !source.is_file() {
        return Err(ValidationError::SourceNotFound(source.to_path_buf()));
    }
    if !allowed_file(source) {
        return Err(ValidationError::UnsupportedExtension(
            source.display().to_string(),
        ));
    }
    if segments.is_empty() {
        return Err(ValidationError::NoSegments);
    }
    segments
        .iter()
        .enumerate()
        .try_for_each(|(i, segment)| segment.validate(i))
}

/// Owns the lifecycle of trim jobs, from submission to cleanup.
pub struct OrchestratorService {
    tool: Arc<dyn MediaTool>,
    progress: Arc<dyn ProgressStore>,
    queue: Arc<dyn JobQueuePort>,
    repo: Arc<dyn VideoRepository>,
    dirs: JobDirs,
    cancellations: Mutex<HashMap<String, (u64, CancellationToken)>>,
}

impl OrchestratorService {
    pub fn new(
        tool: Arc<dyn MediaTool>,
        progress: Arc<dyn ProgressStore>,
        queue: Arc<dyn JobQueuePort>,
        repo: Arc<dyn VideoRepository>,
        dirs: JobDirs,
    ) -> Self {
        Self {
            tool,
            progress,
            queue,
            repo,
            dirs,
            cancellations: Mutex::new(HashMap::new()),
        }
    }

    /// Validate a trim request and hand it to the worker pool.
    ///
    /// Returns as soon as the job is queued with its progress entry at 0.
    pub async fn submit(
        &self,
        owner_id: u64,
        source_path: &Path,
        segments: Vec<TimeSegment>,
    ) -> Result<String, SubmitError> {
        validate_request(source_path, &segments)?;

        let job_id = self.allocate_job_id(Utc::now().timestamp());
        let job = TrimJob {
            output_path: self
                .dirs
                .output_dir
                .join(output_filename(&job_id, source_path)),
            id: job_id.clone(),
            owner_id,
            source_path: source_path.to_path_buf(),
            segments,
        };

        self.lock_cancellations()
            .insert(job_id.clone(), (owner_id, CancellationToken::new()));

        if let Err(e) = self.queue.try_enqueue(job) {
            self.lock_cancellations().remove(&job_id);
            self.progress.remove(&job_id);
            tracing::warn!(job_id = %job_id, error = %e, "trim job rejected");
            return Err(match e {
                QueueError::Full(_) => SubmitError::QueueFull,
                QueueError::Closed(_) => SubmitError::QueueClosed,
            });
        }

        tracing::info!(
            job_id = %job_id,
            owner_id,
            source = %source_path.display(),
            "trim job queued"
        );
        Ok(job_id)
    }

    /// Reserve a job id derived from `unix_secs`, suffixing `-1`, `-2`, ...
    /// while the plain timestamp is taken by another live job.
    pub fn allocate_job_id(&self, unix_secs: i64) -> String {
        let mut attempt = 0u32;
        loop {
            let candidate = if attempt == 0 {
                unix_secs.to_string()
            } else {
                format!("{}-{}", unix_secs, attempt)
            };
            if self.progress.try_register(&candidate) {
                return candidate;
            }
            attempt += 1;
        }
    }

    /// Ask a queued or running job of `owner_id` to stop. It ends as failed.
    ///
    /// Returns `false` for unknown or finished jobs and for jobs of other owners.
    pub fn cancel(&self, job_id: &str, owner_id: u64) -> bool {
        match self.lock_cancellations().get(job_id) {
            Some((owner, token)) if *owner == owner_id => {
                token.cancel();
                tracing::info!(job_id, owner_id, "cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Run one job to completion or failure. Never retries.
    pub async fn run(&self, job: TrimJob) -> Result<(), JobError> {
        let token = self
            .lock_cancellations()
            .entry(job.id.clone())
            .or_insert_with(|| (job.owner_id, CancellationToken::new()))
            .1
            .clone();

        tracing::info!(job_id = %job.id, segments = job.segments.len(), "trim job started");
        let result = self.execute(&job, &token).await;
        self.lock_cancellations().remove(&job.id);

        match &result {
            Ok(()) => tracing::info!(
                job_id = %job.id,
                output = %job.output_path.display(),
                "trim job complete"
            ),
            Err(e) => {
                self.progress.update(&job.id, Progress::Failed);
                tracing::error!(job_id = %job.id, error = %e, "trim job failed");
            }
        }
        result
    }

    async fn execute(&self, job: &TrimJob, token: &CancellationToken) -> Result<(), JobError> {
        fs::create_dir_all(&self.dirs.temp_dir).await?;
        let work_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", job.id))
            .tempdir_in(&self.dirs.temp_dir)?;
        let work_path = work_dir.path().to_path_buf();

        let result = self.process(job, &work_path, token).await;

        if let Err(source) = work_dir.close() {
            let err = CleanupError {
                path: work_path,
                source,
            };
            tracing::warn!(job_id = %job.id, error = %err, "cleanup failed");
        }
        result
    }

    async fn process(
        &self,
        job: &TrimJob,
        work_dir: &Path,
        token: &CancellationToken,
    ) -> Result<(), JobError> {
        let total = job.segments.len();
        let mut segment_files = Vec::with_capacity(total);

        for (index, segment) in job.segments.iter().enumerate() {
            if token.is_cancelled() {
                return Err(JobError::Cancelled);
            }
            let dest = segment_path(work_dir, index, &job.source_path);
            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(JobError::Cancelled),
                extracted = extract_segment(self.tool.as_ref(), &job.source_path, segment, &dest) => {
                    extracted.map_err(|source| JobError::Extract { index, source })?
                }
            }
            segment_files.push(dest);

            let value = extraction_progress(index + 1, total);
            self.progress.update(&job.id, Progress::Running(value));
            tracing::info!(job_id = %job.id, segment = index, progress = value, "segment done");
        }

        let manifest = write_manifest(work_dir, &segment_files).await?;
        if let Some(parent) = job.output_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        self.progress
            .update(&job.id, Progress::Running(CONCAT_STARTED));
        let concatenated = tokio::select! {
            biased;
            _ = token.cancelled() => Err(JobError::Cancelled),
            joined = concat_segments(self.tool.as_ref(), &manifest, &job.output_path) => {
                joined.map_err(JobError::Concat)
            }
        };
        if let Err(e) = concatenated {
            remove_output(&job.output_path).await;
            return Err(e);
        }

        // The record must be durable before anyone can observe 100.
        let filename = output_filename(&job.id, &job.source_path);
        if let Err(e) = self
            .repo
            .record_completed(&job.id, &filename, job.owner_id)
            .await
        {
            remove_output(&job.output_path).await;
            return Err(e.into());
        }

        self.progress.update(&job.id, Progress::Running(COMPLETE));
        Ok(())
    }

    fn lock_cancellations(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, (u64, CancellationToken)>> {
        self.cancellations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop a partial or unrecorded output.
async fn remove_output(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove output"),
    }
}
