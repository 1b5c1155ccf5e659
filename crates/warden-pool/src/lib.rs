//! Bounded-concurrency worker pool: drains a classification job's
//! `WAIT_FOR_SCAN` chunks through the scan pipeline, capped by a
//! semaphore-equivalent buffer width (spec §4.6). `TEST` execution mode
//! runs with capacity 1, so fixtures observe deterministic ordering.

use std::future::Future;

use futures::stream::{self, StreamExt};
use warden_core::Chunk;
use warden_pipeline::ScanOutcome;

pub struct WorkerPool {
    capacity: usize,
}

impl WorkerPool {
    /// `capacity` bounds how many chunks are in flight at once. Zero is
    /// treated as one: a pool that can run nothing is a bug, not a valid
    /// configuration.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1) }
    }

    /// The `TEST` execution mode's pool: strictly sequential, so assertions
    /// about scan order hold.
    pub fn test_mode() -> Self {
        Self::new(1)
    }

    /// Drain `chunks` through `work`, running up to `capacity` concurrently.
    /// Results are returned in completion order, not submission order — the
    /// pipeline has no cross-chunk ordering guarantee (spec §5).
    pub async fn drain<F, Fut>(&self, chunks: Vec<Chunk>, work: F) -> Vec<ScanOutcome>
    where
        F: Fn(Chunk) -> Fut,
        Fut: Future<Output = ScanOutcome>,
    {
        stream::iter(chunks).map(work).buffer_unordered(self.capacity).collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use warden_core::{ChunkKind, Status};

    #[tokio::test]
    async fn test_mode_runs_strictly_sequentially() {
        let pool = WorkerPool::test_mode();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let chunks: Vec<Chunk> = (0..5).map(|i| Chunk::new(1, "a", "a", ChunkKind::Blob, i * ChunkKind::Blob.limit())).collect();

        let results = pool
            .drain(chunks, |mut chunk| {
                let in_flight = in_flight.clone();
                let max_observed = max_observed.clone();
                async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_observed.fetch_max(current, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    chunk.status = Status::Scanned;
                    ScanOutcome::Scanned { chunk, findings: vec![] }
                }
            })
            .await;

        assert_eq!(results.len(), 5);
        assert_eq!(max_observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_pool_never_exceeds_capacity() {
        let pool = WorkerPool::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let chunks: Vec<Chunk> = (0..8).map(|i| Chunk::new(1, "a", "a", ChunkKind::Blob, i * ChunkKind::Blob.limit())).collect();

        pool.drain(chunks, |mut chunk| {
            let in_flight = in_flight.clone();
            let max_observed = max_observed.clone();
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                chunk.status = Status::Scanned;
                ScanOutcome::Scanned { chunk, findings: vec![] }
            }
        })
        .await;

        assert!(max_observed.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn zero_capacity_is_treated_as_one() {
        let pool = WorkerPool::new(0);
        let chunks = vec![Chunk::new(1, "a", "a", ChunkKind::Blob, 0)];
        let results = pool
            .drain(chunks, |mut chunk| async move {
                chunk.status = Status::Scanned;
                ScanOutcome::Scanned { chunk, findings: vec![] }
            })
            .await;
        assert_eq!(results.len(), 1);
    }
}
