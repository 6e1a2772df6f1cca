//! Splicer - Video trimming service
//!
//! Cuts time ranges out of a source video with ffmpeg stream copy and joins
//! them, in order, into one output file.
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (segments, timestamps, ffmpeg integration)
//! - ports/: Trait definitions (progress registry, job queue, video records)
//! - adapters/: Concrete implementations (in-process registry/queue, JSON store, HTTP)
//! - application/: Services (orchestrator, workers, progress reporter, outputs)
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::orchestrator::OrchestratorService;
pub use application::reporter::ProgressReporter;
pub use config::AppConfig;
pub use domain::jobs::{Progress, TimeSegment, TrimJob, VideoRecord};
