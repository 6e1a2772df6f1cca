//! Error taxonomy of the trim-job engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing input. Raised synchronously at submission, before any job exists.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("video file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("invalid file type: {0}")]
    UnsupportedExtension(String),

    #[error("no valid time segments provided")]
    NoSegments,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("segment {index}: start ({start}) must be before end ({end})")]
    InvalidRange {
        index: usize,
        start: String,
        end: String,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// An external media tool could not run or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {output}")]
    Failed {
        program: String,
        status: String,
        output: String,
    },

    #[error("{program} did not finish in time and was killed")]
    TimedOut { program: String },
}

/// Failure of the completed-video persistence collaborator.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage io error: {0}")]
    Io(#[from] io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("video {0} not found")]
    NotFound(u64),

    #[error("video {0} belongs to another owner")]
    Forbidden(u64),
}

/// Removing a job's working directory failed. Logged, never propagated.
#[derive(Debug, Error)]
#[error("failed to remove working directory {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("job queue is full, try again later")]
    QueueFull,

    #[error("job queue is closed")]
    QueueClosed,
}

/// Terminal failure of a running job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("error trimming segment {index}: {source}")]
    Extract {
        index: usize,
        #[source]
        source: ToolError,
    },

    #[error("error combining segments: {0}")]
    Concat(#[source] ToolError),

    #[error("failed to record completed video: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("working directory error: {0}")]
    Io(#[from] io::Error),

    #[error("job was cancelled")]
    Cancelled,
}
