//! Bounded in-process job queue.

use crate::domain::jobs::TrimJob;
use crate::ports::queue::{JobQueuePort, QueueError};
use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// tokio mpsc channel shared by the submitting side and every worker.
#[derive(Debug)]
pub struct ChannelQueue {
    sender: mpsc::Sender<TrimJob>,
    receiver: Mutex<mpsc::Receiver<TrimJob>>,
    closed: CancellationToken,
}

impl ChannelQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
            closed: CancellationToken::new(),
        }
    }

    /// Stop accepting jobs. Workers drain what is already queued.
    pub fn close(&self) {
        self.closed.cancel();
    }
}

#[async_trait]
impl JobQueuePort for ChannelQueue {
    fn try_enqueue(&self, job: TrimJob) -> Result<(), QueueError> {
        if self.closed.is_cancelled() {
            return Err(QueueError::Closed(job));
        }
        self.sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => QueueError::Full(job),
            TrySendError::Closed(job) => QueueError::Closed(job),
        })
    }

    async fn dequeue_job(&self) -> Option<TrimJob> {
        // One worker waits on the receiver at a time, the others wait on the lock.
        let mut receiver = self.receiver.lock().await;
        if self.closed.is_cancelled() {
            return receiver.try_recv().ok();
        }
        tokio::select! {
            biased;
            job = receiver.recv() => job,
            _ = self.closed.cancelled() => receiver.try_recv().ok(),
        }
    }
}
