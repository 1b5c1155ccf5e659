//! Typed mutation batches a diff pass produces, consumed by the
//! control-plane client rather than applied to any local store directly.

use warden_core::Chunk;

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMutation {
    /// `S \ D`: the object vanished from the source (step 1).
    Delete { full_path: String },
    /// An object's on-disk size changed (step 3).
    SetSize { full_path: String, size: u64 },
    /// An existing object now matches a filename-exclusion classifier
    /// (step 5).
    Ignore { full_path: String },
    /// A previously-ignored object no longer matches any exclusion
    /// classifier; it is deleted so discovery creates a fresh record on the
    /// next run (step 5).
    Unignore { full_path: String },
    /// A newly-discovered object matches a filename-exclusion classifier:
    /// an `IGNORED` record is created rather than silently dropped, so the
    /// object is still visible (step 5).
    InsertIgnored { full_path: String, object_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChunkMutation {
    /// A chunk's `(full_path, offset)` no longer exists in the discovered
    /// set (step 2).
    Delete { full_path: String, offset: u64 },
    /// Content at an existing `(full_path, offset)` changed hash (step 4):
    /// the chunk re-enters `WAIT_FOR_SCAN`.
    Update { full_path: String, offset: u64, new_hash: String },
    /// A new `(full_path, offset)` pair appeared (step 4).
    Create { chunk: Chunk },
}

/// The result of reconciling discovered objects against control-plane
/// state: mutation batches plus the resulting work queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceDiff {
    pub object_mutations: Vec<ObjectMutation>,
    pub chunk_mutations: Vec<ChunkMutation>,
    /// Chunks now in `WAIT_FOR_SCAN` after the diff (step 8 already
    /// pruned already-scanned objects).
    pub work_queue: Vec<Chunk>,
}
