//! Background scheduler: a once-a-minute liveness heartbeat, independent
//! of the foreground job ordering (spec §4.5).

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::shutdown::Shutdown;

pub struct BackgroundScheduler;

impl BackgroundScheduler {
    /// Call `heartbeat` every `period` until shutdown is triggered.
    pub async fn run<F, Fut>(period: Duration, mut heartbeat: F, mut shutdown: Shutdown)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!("background scheduler heartbeat");
                    heartbeat().await;
                }
                _ = shutdown.triggered() => {
                    info!("background scheduler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn heartbeat_fires_once_per_period() {
        let (handle, shutdown) = ShutdownHandle::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let task = tokio::spawn(BackgroundScheduler::run(
            Duration::from_secs(60),
            move || {
                let count = count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            },
            shutdown,
        ));

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.trigger();
        let _ = task.await;

        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
