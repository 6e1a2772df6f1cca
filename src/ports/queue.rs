use crate::domain::jobs::TrimJob;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full(TrimJob),
    #[error("queue is closed")]
    Closed(TrimJob),
}

#[async_trait]
pub trait JobQueuePort: Send + Sync {
    /// Enqueue a job without waiting. A full queue hands the job back.
    fn try_enqueue(&self, job: TrimJob) -> Result<(), QueueError>;

    /// Wait for the next job.
    /// Returns `None` once the queue is closed and drained.
    async fn dequeue_job(&self) -> Option<TrimJob>;
}
