//! Monolith Binary - Single-server deployment
//!
//! Wires up:
//! - Local adapters (in-process progress registry and job queue, JSON video store)
//! - Trim workers driving ffmpeg
//! - HTTP inbound adapter

use splicer::adapters::local::{router, AppState, ChannelQueue, InMemoryProgress, JsonFileRepository};
use splicer::application::orchestrator::{JobDirs, OrchestratorService};
use splicer::application::outputs::OutputCatalog;
use splicer::application::reporter::ProgressReporter;
use splicer::application::worker::{spawn_reaper, WorkerService};
use splicer::config::AppConfig;
use splicer::domain::av::cmd::FfmpegExecutor;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // RUST_LOG may come from .env, and config warnings need the subscriber.
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    if !config.video_dir.is_dir() {
        tracing::error!(dir = %config.video_dir.display(), "video directory does not exist");
        std::process::exit(1);
    }
    for dir in [&config.output_dir, &config.temp_dir] {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::error!(dir = %dir.display(), error = %e, "cannot create directory");
            std::process::exit(1);
        }
    }

    // 1. Adapters (Local implementations)
    let repo = match JsonFileRepository::open(&config.data_dir).await {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            tracing::error!(error = %e, "failed to open video store");
            std::process::exit(1);
        }
    };
    let progress = Arc::new(InMemoryProgress::new());
    let queue = Arc::new(ChannelQueue::new(config.queue_capacity));
    let tool = Arc::new(
        FfmpegExecutor::new(&config.ffmpeg_bin, &config.ffprobe_bin)
            .with_timeout(config.tool_timeout),
    );

    // 2. Application Services
    let orchestrator = Arc::new(OrchestratorService::new(
        tool.clone(),
        progress.clone(),
        queue.clone(),
        repo.clone(),
        JobDirs {
            output_dir: config.output_dir.clone(),
            temp_dir: config.temp_dir.clone(),
        },
    ));
    let outputs = Arc::new(OutputCatalog::new(
        repo.clone(),
        progress.clone(),
        tool,
        config.output_dir.clone(),
    ));
    let reporter = ProgressReporter::new(progress.clone(), repo, config.progress_poll_interval);

    // 3. Start Workers
    let workers = Arc::new(WorkerService::new(orchestrator.clone(), queue.clone()));
    let handles = workers.start(config.workers);
    tracing::info!(workers = handles.len(), "started trim workers");

    let reaper = spawn_reaper(
        progress,
        config.progress_ttl,
        config.progress_reap_interval,
    );

    // 4. HTTP Layer
    let app = router(AppState {
        orchestrator,
        reporter,
        outputs,
        video_dir: config.video_dir.clone(),
    });

    // 5. Start Server
    let listener = match tokio::net::TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.bind_address(), error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %config.bind_address(), "listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
    }

    // Queued jobs still run to completion before exit.
    queue.close();
    reaper.abort();
    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
