//! HTTP inbound adapter.
//!
//! Exposes trim submission, live progress and output retrieval to clients.
//! Authentication happens upstream; the owner arrives in `x-owner-id`.

pub mod browse;
pub mod error;
pub mod jobs;
pub mod owner;
pub mod videos;

use crate::application::orchestrator::OrchestratorService;
use crate::application::outputs::OutputCatalog;
use crate::application::reporter::ProgressReporter;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<OrchestratorService>,
    pub reporter: ProgressReporter,
    pub outputs: Arc<OutputCatalog>,
    /// Root that relative `file` selections are resolved against.
    pub video_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/trim", post(jobs::submit_trim))
        .route("/jobs/:job_id/cancel", post(jobs::cancel_job))
        .route("/progress/:job_id", get(jobs::progress_stream))
        .route("/progress/:job_id/current", get(jobs::progress_snapshot))
        .route("/download/:job_id", get(videos::download))
        .route("/video_info/:job_id", get(videos::video_info))
        .route("/my_videos", get(videos::my_videos))
        .route("/list_directory", post(browse::list_directory))
        .route("/delete_video/:video_id", post(videos::delete_video))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
