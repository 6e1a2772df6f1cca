//! In-process progress registry.

use crate::domain::jobs::{Progress, COMPLETE};
use crate::ports::progress::ProgressStore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: Progress,
    touched: Instant,
}

impl Entry {
    fn new(value: Progress) -> Self {
        Self {
            value,
            touched: Instant::now(),
        }
    }
}

/// Mutex-guarded map, shared by every worker and reporter of the process.
#[derive(Debug, Default)]
pub struct InMemoryProgress {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The value to store when `incoming` arrives while `current` is stored.
fn merge(current: Progress, incoming: Progress) -> Progress {
    if current.is_terminal() {
        return current;
    }
    match (current, incoming) {
        (_, Progress::Failed) => Progress::Failed,
        (Progress::Running(c), Progress::Running(v)) => Progress::Running(c.max(v.min(COMPLETE))),
        (Progress::Failed, _) => Progress::Failed,
    }
}

impl ProgressStore for InMemoryProgress {
    fn try_register(&self, job_id: &str) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(job_id) {
            return false;
        }
        entries.insert(job_id.to_string(), Entry::new(Progress::default()));
        true
    }

    fn update(&self, job_id: &str, progress: Progress) {
        let mut entries = self.lock();
        let entry = entries
            .entry(job_id.to_string())
            .or_insert_with(|| Entry::new(Progress::default()));
        entry.value = merge(entry.value, progress);
        entry.touched = Instant::now();
        tracing::debug!(job_id, progress = entry.value.as_i32(), "progress updated");
    }

    fn find(&self, job_id: &str) -> Option<Progress> {
        self.lock().get(job_id).map(|e| e.value)
    }

    fn remove(&self, job_id: &str) {
        self.lock().remove(job_id);
    }

    fn reap(&self, ttl: Duration) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| !(e.value.is_terminal() && e.touched.elapsed() >= ttl));
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_job_reads_zero() {
        let store = InMemoryProgress::new();
        assert_eq!(store.get("nope"), Progress::Running(0));
    }

    #[test]
    fn test_find_distinguishes_reaped_entries() {
        let store = InMemoryProgress::new();
        store.update("job", Progress::Running(100));
        assert_eq!(store.find("job"), Some(Progress::Running(100)));
        store.reap(Duration::ZERO);
        assert_eq!(store.find("job"), None);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let store = InMemoryProgress::new();
        assert!(store.try_register("1700000000"));
        assert!(!store.try_register("1700000000"));
        assert_eq!(store.get("1700000000"), Progress::Running(0));
    }

    #[test]
    fn test_updates_never_lower_progress() {
        let store = InMemoryProgress::new();
        store.try_register("job");
        store.update("job", Progress::Running(60));
        store.update("job", Progress::Running(30));
        assert_eq!(store.get("job"), Progress::Running(60));
        store.update("job", Progress::Running(95));
        assert_eq!(store.get("job"), Progress::Running(95));
    }

    #[test]
    fn test_failure_overrides_and_sticks() {
        let store = InMemoryProgress::new();
        store.update("job", Progress::Running(90));
        store.update("job", Progress::Failed);
        assert_eq!(store.get("job"), Progress::Failed);
        store.update("job", Progress::Running(100));
        assert_eq!(store.get("job"), Progress::Failed);
    }

    #[test]
    fn test_complete_is_final() {
        let store = InMemoryProgress::new();
        store.update("job", Progress::Running(100));
        store.update("job", Progress::Failed);
        assert_eq!(store.get("job"), Progress::Running(100));
    }

    #[test]
    fn test_values_above_complete_are_clamped() {
        let store = InMemoryProgress::new();
        store.update("job", Progress::Running(250));
        assert_eq!(store.get("job"), Progress::Running(100));
    }

    #[test]
    fn test_reap_only_removes_terminal_entries() {
        let store = InMemoryProgress::new();
        store.update("done", Progress::Running(100));
        store.update("failed", Progress::Failed);
        store.update("running", Progress::Running(40));

        assert_eq!(store.reap(Duration::from_secs(3600)), 0);
        assert_eq!(store.reap(Duration::ZERO), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("running"), Progress::Running(40));
    }

    #[test]
    fn test_concurrent_writers_keep_maximum() {
        let store = Arc::new(InMemoryProgress::new());
        std::thread::scope(|scope| {
            for t in 0..8u8 {
                let store = store.clone();
                scope.spawn(move || {
                    for v in 0..=90u8 {
                        store.update("job", Progress::Running(v.saturating_sub(t)));
                        store.update(&format!("other-{t}"), Progress::Running(v));
                    }
                });
            }
        });
        assert_eq!(store.get("job"), Progress::Running(90));
        assert_eq!(store.get("other-3"), Progress::Running(90));
    }
}
