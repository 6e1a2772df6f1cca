use super::cmd::{check_output, MediaTool};
use crate::domain::error::ToolError;
use crate::domain::jobs::TimeSegment;
use std::path::{Path, PathBuf};

/// Name of the `index`-th intermediate segment, keeping the source container.
pub fn segment_file_name(index: usize, source: &Path) -> String {
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| String::from("mp4"));
    format!("segment_{}.{}", index, ext)
}

pub fn segment_path(work_dir: &Path, index: usize, source: &Path) -> PathBuf {
    work_dir.join(segment_file_name(index, source))
}

/// Cut one segment out of `source` into `dest` without re-encoding.
pub async fn extract_segment<T>(
    tool: &T,
    source: &Path,
    segment: &TimeSegment,
    dest: &Path,
) -> Result<(), ToolError>
where
    T: MediaTool + ?Sized,
{
    let result = tool
        .extract(source, segment.start.as_str(), segment.end.as_str(), dest)
        .await;
    check_output("ffmpeg", result)?;

    tracing::debug!(
        source = %source.display(),
        dest = %dest.display(),
        start = %segment.start,
        end = %segment.end,
        "segment extracted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::av::cmd::test_support::{output_with, success};
    use crate::domain::av::cmd::MockMediaTool;
    use crate::domain::time::Timestamp;
    use mockall::predicate::eq;

    fn segment(start: &str, end: &str) -> TimeSegment {
        TimeSegment {
            start: Timestamp::parse(start).unwrap(),
            end: Timestamp::parse(end).unwrap(),
        }
    }

    #[test]
    fn test_segment_file_name_keeps_container() {
        assert_eq!(segment_file_name(0, Path::new("a/clip.MKV")), "segment_0.mkv");
        assert_eq!(segment_file_name(3, Path::new("clip.mp4")), "segment_3.mp4");
        assert_eq!(segment_file_name(1, Path::new("noext")), "segment_1.mp4");
    }

    #[tokio::test]
    async fn test_extract_segment_passes_raw_timestamps() {
        let mut tool = MockMediaTool::new();
        tool.expect_extract()
            .with(
                eq(Path::new("in.mp4")),
                eq("00:01:00"),
                eq("75.5"),
                eq(Path::new("work/segment_0.mp4")),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(success()));

        let result = extract_segment(
            &tool,
            Path::new("in.mp4"),
            &segment("00:01:00", "75.5"),
            Path::new("work/segment_0.mp4"),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_extract_segment_failure_surfaces_output() {
        let mut tool = MockMediaTool::new();
        tool.expect_extract()
            .returning(|_, _, _, _| Ok(output_with(1, "moov atom not found")));

        let err = extract_segment(
            &tool,
            Path::new("broken.mp4"),
            &segment("0", "1"),
            Path::new("segment_0.mp4"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("moov atom not found"));
    }
}
