//! Trim submission, cancellation and progress routes.

use super::error::ApiError;
use super::owner::OwnerId;
use super::AppState;
use crate::domain::error::ValidationError;
use crate::domain::jobs::{ProgressEvent, TimeSegment};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct TrimRequest {
    /// Path relative to the video directory.
    #[serde(default)]
    pub file: Option<String>,
    /// Full path to a source anywhere on disk; takes precedence over `file`.
    #[serde(default)]
    pub custom_path: Option<String>,
    #[serde(default)]
    pub time_segments: Vec<TimeSegment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrimResponse {
    pub job_id: String,
}

/// A relative path that stays inside the directory it is joined to.
pub fn path_is_valid(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

pub fn resolve_source(
    video_dir: &Path,
    file: Option<&str>,
    custom_path: Option<&str>,
) -> Result<PathBuf, ValidationError> {
    if let Some(custom) = custom_path.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(custom));
    }

    let file = file
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ValidationError::InvalidPath(String::from("no file given")))?;
    let relative = Path::new(file);
    if !path_is_valid(relative) {
        return Err(ValidationError::InvalidPath(file.to_string()));
    }
    Ok(video_dir.join(relative))
}

pub async fn submit_trim(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    payload: Result<Json<TrimRequest>, JsonRejection>,
) -> Result<Json<TrimResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let source = resolve_source(
        &state.video_dir,
        request.file.as_deref(),
        request.custom_path.as_deref(),
    )?;

    let job_id = state
        .orchestrator
        .submit(owner_id, &source, request.time_segments)
        .await?;
    Ok(Json(TrimResponse { job_id }))
}

pub async fn cancel_job(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    UrlPath(job_id): UrlPath<String>,
) -> Result<StatusCode, ApiError> {
    if state.orchestrator.cancel(&job_id, owner_id) {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(ApiError::not_found("no running job with that id"))
    }
}

/// Server-sent events, one `{"progress": n}` per tick, closed after 100 or -1.
pub async fn progress_stream(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(job_id = %job_id, "progress subscriber connected");
    let events = state
        .reporter
        .subscribe(job_id)
        .map(|progress| Event::default().json_data(ProgressEvent::from(progress)));
    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn progress_snapshot(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> Json<ProgressEvent> {
    Json(state.reporter.current(&job_id).await.into())
}
