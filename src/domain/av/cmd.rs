use crate::domain::error::ToolError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Runs the external media tools. Each call blocks its caller until the
/// subprocess exits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn extract(&self, source: &Path, start: &str, end: &str, dest: &Path)
        -> io::Result<Output>;

    async fn concat(&self, manifest: &Path, dest: &Path) -> io::Result<Output>;

    async fn probe_duration(&self, media: &Path) -> io::Result<Output>;
}

/// `ffmpeg`/`ffprobe` subprocess runner.
#[derive(Debug, Clone)]
pub struct FfmpegExecutor {
    ffmpeg: String,
    ffprobe: String,
    timeout: Option<Duration>,
}

impl FfmpegExecutor {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout: None,
        }
    }

    /// Kill any tool call running longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, program: &str, args: Vec<OsString>) -> io::Result<Output> {
        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .unwrap_or_else(|_| {
                    Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("{} exceeded {:?}", program, limit),
                    ))
                }),
            None => command.output().await,
        }
    }
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl MediaTool for FfmpegExecutor {
    async fn extract(
        &self,
        source: &Path,
        start: &str,
        end: &str,
        dest: &Path,
    ) -> io::Result<Output> {
        self.run(&self.ffmpeg, extract_args(source, start, end, dest))
            .await
    }

    async fn concat(&self, manifest: &Path, dest: &Path) -> io::Result<Output> {
        self.run(&self.ffmpeg, concat_args(manifest, dest)).await
    }

    async fn probe_duration(&self, media: &Path) -> io::Result<Output> {
        self.run(&self.ffprobe, probe_duration_args(media)).await
    }
}

/// Stream-copy cut of `[start, end)`.
pub fn extract_args(source: &Path, start: &str, end: &str, dest: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        source.into(),
        "-ss".into(),
        start.into(),
        "-to".into(),
        end.into(),
        "-c".into(),
        "copy".into(),
        dest.into(),
    ]
}

/// Stream-copy join driven by a concat-demuxer manifest.
pub fn concat_args(manifest: &Path, dest: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest.into(),
        "-c".into(),
        "copy".into(),
        dest.into(),
    ]
}

pub fn probe_duration_args(media: &Path) -> Vec<OsString> {
    vec![
        "-v".into(),
        "error".into(),
        "-show_entries".into(),
        "format=duration".into(),
        "-of".into(),
        "default=noprint_wrappers=1:nokey=1".into(),
        media.into(),
    ]
}

/// stdout followed by stderr, the way the tools interleave them on a terminal.
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text.trim_end().to_string()
}

/// Map a finished (or failed to start) tool call onto the engine's error type.
pub fn check_output(program: &str, result: io::Result<Output>) -> Result<Output, ToolError> {
    match result {
        Ok(output) if output.status.success() => Ok(output),
        Ok(output) => Err(ToolError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            output: combined_output(&output),
        }),
        Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(ToolError::TimedOut {
            program: program.to_string(),
        }),
        Err(source) => Err(ToolError::Spawn {
            program: program.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};

    pub fn output_with(code: i32, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    pub fn success() -> Output {
        output_with(0, "")
    }
}
