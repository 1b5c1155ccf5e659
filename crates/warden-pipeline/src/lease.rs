//! Lease acquisition boundary (spec §4.4 step 1): a conditional
//! `WAIT_FOR_SCAN -> IN_PROGRESS` status update keyed on `(chunk.id,
//! WAIT_FOR_SCAN)`. The control-plane client implements this over HTTP;
//! tests implement it in memory.

use async_trait::async_trait;

/// Whether a lease attempt on `chunk_id` succeeded. Implementations must
/// be atomic from the control plane's perspective: if the update affects
/// zero rows (another agent already moved the chunk), this returns
/// `false` rather than erroring.
#[async_trait]
pub trait LeaseBroker: Send + Sync {
    async fn try_lease(&self, chunk_id: i64) -> bool;
    async fn release(&self, chunk_id: i64, scanned_at: chrono::DateTime<chrono::Utc>, hash: String);
}
