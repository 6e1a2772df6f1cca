use crate::domain::jobs::{Progress, COMPLETE};
use crate::ports::progress::ProgressStore;
use crate::ports::repository::VideoRepository;
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    First,
    Polling,
    Done,
}

/// Live view of one job's progress, read from the shared registry.
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn ProgressStore>,
    repo: Arc<dyn VideoRepository>,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        repo: Arc<dyn VideoRepository>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            repo,
            interval,
        }
    }

    /// Progress of `job_id` right now.
    ///
    /// Ids missing from the registry were reaped or never issued: they read as
    /// 100 when a video was recorded for them and as failed otherwise.
    pub async fn current(&self, job_id: &str) -> Progress {
        if let Some(progress) = self.store.find(job_id) {
            return progress;
        }
        match self.repo.find_by_job(job_id).await {
            Ok(Some(_)) => Progress::Running(COMPLETE),
            Ok(None) => Progress::Failed,
            Err(e) => {
                // Not terminal, so subscribers ask again on the next tick.
                tracing::warn!(job_id, error = %e, "cannot resolve unregistered job");
                Progress::default()
            }
        }
    }

    /// Emits the current value right away, then once per interval, and ends
    /// after the first terminal value (100 or failed).
    ///
    /// The stream only reads the registry; dropping it has no effect on the job.
    pub fn subscribe(&self, job_id: String) -> impl Stream<Item = Progress> + Send + 'static {
        let reporter = self.clone();

        stream::unfold(Tick::First, move |tick| {
            let reporter = reporter.clone();
            let job_id = job_id.clone();
            async move {
                match tick {
                    Tick::Done => return None,
                    Tick::Polling => tokio::time::sleep(reporter.interval).await,
                    Tick::First => {}
                }

                let progress = reporter.current(&job_id).await;
                let next = if progress.is_terminal() {
                    Tick::Done
                } else {
                    Tick::Polling
                };
                Some((progress, next))
            }
        })
    }
}
