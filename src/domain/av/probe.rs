use super::cmd::{check_output, MediaTool};
use crate::domain::error::ToolError;
use std::path::Path;

/// Container duration in seconds, as reported by ffprobe.
pub async fn media_duration<T>(tool: &T, media: &Path) -> Result<f64, ToolError>
where
    T: MediaTool + ?Sized,
{
    let output = check_output("ffprobe", tool.probe_duration(media).await)?;
    let text = String::from_utf8_lossy(&output.stdout);
    text.trim()
        .parse::<f64>()
        .map_err(|_| ToolError::Failed {
            program: String::from("ffprobe"),
            status: output.status.to_string(),
            output: format!("unexpected duration output: {:?}", text.trim()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::av::cmd::test_support::success;
    use crate::domain::av::cmd::MockMediaTool;

    #[tokio::test]
    async fn test_media_duration_parses_stdout() {
        let mut tool = MockMediaTool::new();
        tool.expect_probe_duration().returning(|_| {
            let mut out = success();
            out.stdout = b"12.480000\n".to_vec();
            Ok(out)
        });
        let duration = media_duration(&tool, Path::new("clip.mp4")).await.unwrap();
        assert!((duration - 12.48).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_media_duration_rejects_non_numeric() {
        let mut tool = MockMediaTool::new();
        tool.expect_probe_duration().returning(|_| {
            let mut out = success();
            out.stdout = b"N/A\n".to_vec();
            Ok(out)
        });
        assert!(media_duration(&tool, Path::new("clip.mp4")).await.is_err());
    }
}
