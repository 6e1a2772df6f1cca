//! Output retrieval and per-owner video management routes.

use super::error::ApiError;
use super::owner::OwnerId;
use super::AppState;
use crate::application::outputs::{OutputInfo, OwnedVideo};
use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Stream the output of `job_id` back as a download.
pub async fn download(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> Result<Response, ApiError> {
    let path = state
        .outputs
        .locate(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let file = File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_default();

    tracing::info!(job_id = %job_id, file = %path.display(), "serving download");
    let headers = [
        (header::CONTENT_TYPE, String::from("application/octet-stream")),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

pub async fn video_info(
    State(state): State<AppState>,
    UrlPath(job_id): UrlPath<String>,
) -> Result<Json<OutputInfo>, ApiError> {
    state
        .outputs
        .info(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Video not found"))
}

pub async fn my_videos(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
) -> Result<Json<Vec<OwnedVideo>>, ApiError> {
    Ok(Json(state.outputs.list_for_owner(owner_id).await?))
}

pub async fn delete_video(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    UrlPath(video_id): UrlPath<u64>,
) -> Result<Json<Value>, ApiError> {
    state.outputs.delete(video_id, owner_id).await?;
    Ok(Json(
        json!({ "success": true, "message": "Video deleted successfully" }),
    ))
}
