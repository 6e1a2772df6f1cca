//! Configuration loaded from the environment (and `.env`, when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Root of the source videos users pick from
    pub video_dir: PathBuf,
    /// Finished outputs, named `trimmed_{job_id}_{basename}`
    pub output_dir: PathBuf,
    /// Parent of the per-job working directories
    pub temp_dir: PathBuf,
    /// Where the video records are kept
    pub data_dir: PathBuf,
    /// Number of jobs run at the same time
    pub workers: usize,
    /// Jobs waiting for a worker before submissions are refused
    pub queue_capacity: usize,
    /// Kill ffmpeg/ffprobe calls running longer than this
    pub tool_timeout: Option<Duration>,
    /// How long finished progress entries stay readable
    pub progress_ttl: Duration,
    pub progress_reap_interval: Duration,
    pub progress_poll_interval: Duration,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            video_dir: path_var("VIDEO_DIR", "videos"),
            output_dir: path_var("OUTPUT_DIR", "outputs"),
            temp_dir: path_var("TEMP_DIR", "temp"),
            data_dir: path_var("DATA_DIR", "data"),
            workers: parsed_var("WORKERS", 4),
            queue_capacity: parsed_var("QUEUE_CAPACITY", 64),
            tool_timeout: env::var("TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            progress_ttl: Duration::from_secs(parsed_var("PROGRESS_TTL_SECS", 3600)),
            progress_reap_interval: Duration::from_secs(parsed_var(
                "PROGRESS_REAP_INTERVAL_SECS",
                60,
            )),
            progress_poll_interval: Duration::from_millis(parsed_var(
                "PROGRESS_POLL_INTERVAL_MS",
                1000,
            )),
            ffmpeg_bin: env::var("FFMPEG_BIN").unwrap_or_else(|_| String::from("ffmpeg")),
            ffprobe_bin: env::var("FFPROBE_BIN").unwrap_or_else(|_| String::from("ffprobe")),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| String::from(default)))
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}
