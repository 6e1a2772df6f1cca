use super::orchestrator::OrchestratorService;
use crate::ports::progress::ProgressStore;
use crate::ports::queue::JobQueuePort;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fixed pool of tasks running queued trim jobs, one job per task at a time.
pub struct WorkerService {
    orchestrator: Arc<OrchestratorService>,
    queue: Arc<dyn JobQueuePort>,
}

impl WorkerService {
    pub fn new(orchestrator: Arc<OrchestratorService>, queue: Arc<dyn JobQueuePort>) -> Self {
        Self {
            orchestrator,
            queue,
        }
    }

    /// Spawn `count` workers. They exit once the queue is closed and drained.
    pub fn start(self: &Arc<Self>, count: usize) -> Vec<JoinHandle<()>> {
        (0..count.max(1))
            .map(|id| {
                let worker = self.clone();
                tokio::spawn(async move { worker.run_worker_loop(id).await })
            })
            .collect()
    }

    pub async fn run_worker_loop(&self, worker_id: usize) {
        tracing::debug!(worker_id, "worker started");
        while let Some(job) = self.queue.dequeue_job().await {
            let job_id = job.id.clone();
            tracing::debug!(worker_id, job_id = %job_id, "worker picked up job");
            // Failures are recorded in the registry and logged by the orchestrator.
            let _ = self.orchestrator.run(job).await;
        }
        tracing::debug!(worker_id, "worker stopped");
    }
}

/// Periodically drop finished entries from the progress registry.
pub fn spawn_reaper(
    store: Arc<dyn ProgressStore>,
    ttl: Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = store.reap(ttl);
            if removed > 0 {
                tracing::debug!(removed, "reaped finished progress entries");
            }
        }
    })
}
