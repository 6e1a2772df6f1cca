//! Source picker: browse the video directory.

use super::error::ApiError;
use super::jobs::path_is_valid;
use super::AppState;
use crate::application::orchestrator::allowed_file;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct ListRequest {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Relative to the video directory, usable as `file` in a trim request.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Directories and trimmable files directly under `root/relative`.
pub async fn list_entries(root: &Path, relative: &str) -> io::Result<Vec<DirEntry>> {
    let mut dir = tokio::fs::read_dir(root.join(relative)).await?;
    let mut entries = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = Path::new(relative).join(&name).to_string_lossy().into_owned();
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(entry = %name, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if metadata.is_dir() {
            entries.push(DirEntry {
                name,
                kind: EntryKind::Directory,
                path,
                size: None,
            });
        } else if metadata.is_file() && allowed_file(Path::new(&name)) {
            entries.push(DirEntry {
                name,
                kind: EntryKind::File,
                path,
                size: Some(metadata.len()),
            });
        }
    }

    entries.sort_by(|a, b| {
        (a.kind != EntryKind::Directory, &a.name).cmp(&(b.kind != EntryKind::Directory, &b.name))
    });
    Ok(entries)
}

pub async fn list_directory(
    State(state): State<AppState>,
    payload: Result<Json<ListRequest>, JsonRejection>,
) -> Result<Json<Vec<DirEntry>>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let relative = request.path.trim();

    if !path_is_valid(Path::new(relative)) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid path"));
    }

    match list_entries(&state.video_dir, relative).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ApiError::not_found("Directory not found"))
        }
        Err(e) => {
            tracing::warn!(path = %relative, error = %e, "cannot list directory");
            Err(ApiError::new(StatusCode::BAD_REQUEST, "Cannot list directory"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_lists_directories_first_and_filters_files() {
        let root = tempdir().unwrap();
        std::fs::create_dir(root.path().join("season1")).unwrap();
        std::fs::write(root.path().join("b.MKV"), b"12345").unwrap();
        std::fs::write(root.path().join("a.mp4"), b"123").unwrap();
        std::fs::write(root.path().join("notes.txt"), b"skip").unwrap();

        let entries = list_entries(root.path(), "").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["season1", "a.mp4", "b.MKV"]);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[0].size, None);
        assert_eq!(entries[1].size, Some(3));
    }

    #[tokio::test]
    async fn test_nested_paths_are_relative_to_root() {
        let root = tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("show/extras")).unwrap();
        std::fs::write(root.path().join("show/ep1.mov"), b"x").unwrap();

        let entries = list_entries(root.path(), "show").await.unwrap();
        assert_eq!(entries[0].path, "show/extras");
        assert_eq!(entries[1].path, "show/ep1.mov");
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_found() {
        let root = tempdir().unwrap();
        let err = list_entries(root.path(), "nope").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = DirEntry {
            name: String::from("a.mp4"),
            kind: EntryKind::File,
            path: String::from("a.mp4"),
            size: Some(3),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "file");
        assert_eq!(json["size"], 3);
    }
}
