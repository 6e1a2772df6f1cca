use super::cmd::{check_output, MediaTool};
use crate::domain::error::ToolError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const MANIFEST_NAME: &str = "segments.txt";

/// Concat-demuxer manifest body. Entries are file names relative to the
/// manifest's own directory, in the given order.
pub fn manifest_contents(segment_files: &[PathBuf]) -> String {
    segment_files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("file '{}'\n", name.replace('\'', r"'\''"))
        })
        .collect()
}

/// Write the manifest for `segment_files` into `work_dir`.
pub async fn write_manifest(work_dir: &Path, segment_files: &[PathBuf]) -> io::Result<PathBuf> {
    let manifest = work_dir.join(MANIFEST_NAME);
    fs::write(&manifest, manifest_contents(segment_files)).await?;
    Ok(manifest)
}

/// Join the segments listed in `manifest` into `dest` without re-encoding.
pub async fn concat_segments<T>(tool: &T, manifest: &Path, dest: &Path) -> Result<(), ToolError>
where
    T: MediaTool + ?Sized,
{
    let result = tool.concat(manifest, dest).await;
    check_output("ffmpeg", result)?;
    tracing::debug!(dest = %dest.display(), "segments concatenated");
    Ok(())
}
