//! Foreground scheduler: single-threaded job ordering, so any given
//! classification is always processed sequentially (spec §4.5, §5).

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::shutdown::Shutdown;

/// Tracks which classification jobs are already registered. Job
/// identifier = classification id, so re-registering the same id is a
/// no-op — the de-duplication the original relies on instead of an
/// explicit "already scheduled" check.
#[derive(Default)]
pub struct ForegroundScheduler {
    registered: HashSet<String>,
}

impl ForegroundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff `id` was not already registered.
    pub fn register_if_absent(&mut self, id: impl Into<String>) -> bool {
        self.registered.insert(id.into())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.registered.contains(id)
    }

    /// Run `detect_new_tasks` then `rescan_by_data_type`, in that order,
    /// every `period`, until shutdown is triggered. The two run
    /// back-to-back on the same tick rather than on independent timers,
    /// which is what "single-threaded scheduler for job ordering" buys:
    /// neither job's iteration overlaps the other's.
    pub async fn run<F1, Fut1, F2, Fut2>(
        &mut self,
        period: Duration,
        mut detect_new_tasks: F1,
        mut rescan_by_data_type: F2,
        mut shutdown: Shutdown,
    ) where
        F1: FnMut() -> Fut1,
        Fut1: Future<Output = ()>,
        F2: FnMut() -> Fut2,
        Fut2: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("foreground scheduler tick: detect_new_tasks");
                    detect_new_tasks().await;
                    info!("foreground scheduler tick: rescan_by_data_type");
                    rescan_by_data_type().await;
                }
                _ = shutdown.triggered() => {
                    info!("foreground scheduler shutting down");
                    break;
                }
            }
        }
    }
}

/// Run a single per-classification job: wait `delay`, run `task`, then
/// reschedule with whatever delay `task` returns (the classification's
/// declared `scanning_period_minutes`, spec §4.5).
pub async fn run_periodic_job<F, Fut>(mut delay: Duration, mut shutdown: Shutdown, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Duration>,
{
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                delay = task().await;
            }
            _ = shutdown.triggered() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn register_if_absent_deduplicates() {
        let mut scheduler = ForegroundScheduler::new();
        assert!(scheduler.register_if_absent("classification-1"));
        assert!(!scheduler.register_if_absent("classification-1"));
        assert!(scheduler.is_registered("classification-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn tick_runs_detect_then_rescan_in_order() {
        let (handle, shutdown) = ShutdownHandle::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut scheduler = ForegroundScheduler::new();

        let order_a = order.clone();
        let order_b = order.clone();
        let task = tokio::spawn(async move {
            scheduler
                .run(
                    Duration::from_secs(1),
                    move || {
                        let order = order_a.clone();
                        async move { order.lock().unwrap().push("detect") }
                    },
                    move || {
                        let order = order_b.clone();
                        async move { order.lock().unwrap().push("rescan") }
                    },
                    shutdown,
                )
                .await;
        });

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.trigger();
        let _ = task.await;

        let recorded = order.lock().unwrap().clone();
        assert_eq!(recorded, vec!["detect", "rescan"]);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_job_reschedules_with_returned_delay() {
        let (handle, shutdown) = ShutdownHandle::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let task = tokio::spawn(run_periodic_job(Duration::from_secs(1), shutdown, move || {
            let runs = runs_clone.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Duration::from_secs(1)
            }
        }));

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.trigger();
        let _ = task.await;

        assert!(runs.load(Ordering::SeqCst) >= 2);
    }
}
