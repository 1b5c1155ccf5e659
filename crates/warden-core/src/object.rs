//! Discovered objects (spec §3).

use crate::chunk::Chunk;
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Ownership/ACL metadata a connector may be able to fill in during
/// discovery. Fields are best-effort; not every source exposes all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub owner: Option<String>,
    pub acl: Option<String>,
}

/// A file/table/document discovered within a [`crate::source::Source`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub metadata_id: i64,
    /// Globally unique within a source; the stable diff key.
    pub full_path: String,
    /// Opaque connector key used to fetch bytes.
    pub fetch_path: String,
    pub object_name: String,
    /// Connector-defined version token; re-appearance with the same etag
    /// means content is unchanged (spec §3 invariant 1).
    pub etag: String,
    pub size: u64,
    pub ownership: Ownership,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub labels: Vec<String>,
    pub status: Status,
    pub is_phi: bool,
    pub chunks: Vec<Chunk>,
}

impl ObjectRecord {
    /// The diff key: `(full_path, etag)` must be unique per `(account,
    /// source)` (spec §3 invariant 1, §8 invariant 4).
    pub fn diff_key(&self) -> (&str, &str) {
        (&self.full_path, &self.etag)
    }

    /// Recompute `status` from the current chunk set (spec §3 invariant 4).
    /// An object with no chunks is `Scanned` (zero-size / unsupported
    /// extension, spec §4.2).
    pub fn recompute_status(&mut self) {
        if self.status == Status::Ignored {
            return;
        }
        self.status = Status::aggregate(self.chunks.iter().map(|c| c.status)).unwrap_or(Status::Scanned);
    }
}
