use super::error::ValidationError;
use super::time::Timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Share of total progress reserved for segment extraction.
pub const EXTRACTION_SHARE: u8 = 90;
/// Progress published right before concatenation starts.
pub const CONCAT_STARTED: u8 = 95;
pub const COMPLETE: u8 = 100;
/// Wire value of a failed job.
pub const FAILED_SENTINEL: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSegment {
    #[serde(alias = "start_time")]
    pub start: Timestamp,
    #[serde(alias = "end_time")]
    pub end: Timestamp,
}

impl TimeSegment {
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.start.seconds() < self.end.seconds() {
            Ok(())
        } else {
            Err(ValidationError::InvalidRange {
                index,
                start: self.start.to_string(),
                end: self.end.to_string(),
            })
        }
    }
}

/// A trim job as dispatched to the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimJob {
    pub id: String,
    pub owner_id: u64,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub segments: Vec<TimeSegment>,
}

/// Progress of one job: a percentage while running, or the failure sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Running(u8),
    Failed,
}

impl Progress {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Progress::Failed | Progress::Running(COMPLETE))
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Progress::Running(v) => i32::from(*v),
            Progress::Failed => FAILED_SENTINEL,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::Running(0)
    }
}

/// Body of one progress event as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub progress: i32,
}

impl From<Progress> for ProgressEvent {
    fn from(p: Progress) -> Self {
        Self {
            progress: p.as_i32(),
        }
    }
}

/// Progress after `done` of `total` segments were extracted.
pub fn extraction_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = (done as f64 / total as f64 * f64::from(EXTRACTION_SHARE)).round();
    scaled.min(f64::from(EXTRACTION_SHARE)) as u8
}

/// Output file name for a job. Existing stored outputs rely on this exact shape.
pub fn output_filename(job_id: &str, source: &Path) -> String {
    let basename = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("trimmed_{}_{}", job_id, basename)
}

/// A completed output, as persisted by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: u64,
    pub job_id: String,
    pub filename: String,
    pub owner_id: u64,
    pub created_at: DateTime<Utc>,
}
