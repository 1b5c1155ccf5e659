//! Chunk addressing and tiling (spec §3, §4.2, §8).

use crate::status::Status;
use serde::{Deserialize, Serialize};

/// The three object shapes a connector can tile into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Blob/file content; `offset`/`limit` are bytes.
    Blob,
    /// Row-oriented tabular content; `offset`/`limit` are row indices.
    Table,
    /// Document-oriented (NoSQL) content; `offset`/`limit` are document indices.
    Document,
}

impl ChunkKind {
    /// Compile-time tiling limit per kind (spec §3: 1 MB / 100,000 rows /
    /// 1,000 documents).
    pub const fn limit(self) -> u64 {
        match self {
            ChunkKind::Blob => 1_000_000,
            ChunkKind::Table => 100_000,
            ChunkKind::Document => 1_000,
        }
    }
}

/// Bytes of preceding content a blob fetch is expanded by when
/// `offset > 0`, so entities straddling a chunk boundary are detected by
/// the neighbouring chunk (spec §4.2).
pub const OVERLAP_BYTES: u64 = 255;

/// Up to this many findings are batched per control-plane POST (spec §4.1,
/// §4.4).
pub const SENSITIVE_DATA_CHUNK: usize = 100_000;

/// Compute the tiled chunk offsets for an object of the given `size` under
/// `kind`'s limit: `{0, L, 2L, ..., floor((size-1)/L)*L}`, empty for
/// `size == 0` (spec §8 invariant 1).
pub fn tile_offsets(size: u64, kind: ChunkKind) -> Vec<u64> {
    if size == 0 {
        return Vec::new();
    }
    let limit = kind.limit();
    let count = size.div_ceil(limit);
    (0..count).map(|i| i * limit).collect()
}

/// A bounded window of an object's content, addressed by `(offset, limit)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: i64,
    pub metadata_id: i64,
    pub full_path: String,
    pub fetch_path: String,
    pub kind: ChunkKind,
    pub offset: u64,
    pub limit: u64,
    pub hash: Option<String>,
    pub status: Status,
    pub scanned_at: Option<chrono::DateTime<chrono::Utc>>,
    pub instance_id: Option<String>,
    pub latest_data_type: Option<chrono::DateTime<chrono::Utc>>,
    pub is_phi: bool,
}

impl Chunk {
    pub fn new(
        metadata_id: i64,
        full_path: impl Into<String>,
        fetch_path: impl Into<String>,
        kind: ChunkKind,
        offset: u64,
    ) -> Self {
        Self {
            id: 0,
            metadata_id,
            full_path: full_path.into(),
            fetch_path: fetch_path.into(),
            kind,
            offset,
            limit: kind.limit(),
            hash: None,
            status: Status::WaitForScan,
            scanned_at: None,
            instance_id: None,
            latest_data_type: None,
            is_phi: false,
        }
    }

    /// Fetch range for this chunk, applying the overlap rule for blob
    /// chunks with `offset > 0` (spec §4.2, §8 boundary behaviour).
    pub fn fetch_range(&self) -> (u64, u64) {
        if self.kind == ChunkKind::Blob && self.offset > 0 {
            let expanded_offset = self.offset.saturating_sub(OVERLAP_BYTES);
            let expanded_len = self.limit + (self.offset - expanded_offset);
            (expanded_offset, expanded_len)
        } else {
            (self.offset, self.limit)
        }
    }

    /// A chunk hash is present iff it has passed the pipeline at least
    /// once (spec §3 invariant 3).
    pub fn needs_rescan(&self) -> bool {
        self.hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_has_no_chunks() {
        assert_eq!(tile_offsets(0, ChunkKind::Blob), Vec::<u64>::new());
    }

    #[test]
    fn exactly_one_limit_is_one_chunk() {
        assert_eq!(tile_offsets(ChunkKind::Blob.limit(), ChunkKind::Blob), vec![0]);
    }

    #[test]
    fn size_growth_creates_trailing_offset() {
        let l = ChunkKind::Blob.limit();
        assert_eq!(tile_offsets(2 * l + 1, ChunkKind::Blob), vec![0, l, 2 * l]);
    }

    #[test]
    fn offsets_tile_without_overlap() {
        let offsets = tile_offsets(3_500_000, ChunkKind::Blob);
        assert_eq!(offsets, vec![0, 1_000_000, 2_000_000, 3_000_000]);
    }

    #[test]
    fn fetch_range_expands_low_side_with_overlap() {
        let mut c = Chunk::new(1, "a", "a", ChunkKind::Blob, 1_000_000);
        c.limit = ChunkKind::Blob.limit();
        let (offset, len) = c.fetch_range();
        assert_eq!(offset, 1_000_000 - OVERLAP_BYTES);
        assert_eq!(len, ChunkKind::Blob.limit() + OVERLAP_BYTES);
    }

    #[test]
    fn first_chunk_fetch_has_no_overlap() {
        let c = Chunk::new(1, "a", "a", ChunkKind::Blob, 0);
        assert_eq!(c.fetch_range(), (0, ChunkKind::Blob.limit()));
    }

    #[test]
    fn table_chunks_never_get_byte_overlap() {
        let mut c = Chunk::new(1, "a", "a", ChunkKind::Table, 100_000);
        c.limit = ChunkKind::Table.limit();
        assert_eq!(c.fetch_range(), (100_000, 100_000));
    }
}
