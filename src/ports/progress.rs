use crate::domain::jobs::Progress;
use std::time::Duration;

/// Concurrency-safe map from job id to its progress.
///
/// Writers are job runners, readers are progress reporters. Running values are
/// monotone: a lower percentage never replaces a higher one. `Failed` overwrites
/// any running value, and once an entry is terminal (100 or failed) it no
/// longer changes.
pub trait ProgressStore: Send + Sync {
    /// Create the entry at 0. Returns `false` if the id is already taken.
    fn try_register(&self, job_id: &str) -> bool;

    fn update(&self, job_id: &str, progress: Progress);

    /// Current value, or `None` when the id was never registered or has been reaped.
    fn find(&self, job_id: &str) -> Option<Progress>;

    /// Current value; an unknown id reads as `Running(0)`.
    fn get(&self, job_id: &str) -> Progress {
        self.find(job_id).unwrap_or_default()
    }

    fn remove(&self, job_id: &str);

    /// Drop terminal entries not updated for `ttl`. Returns how many were removed.
    fn reap(&self, ttl: Duration) -> usize;
}
