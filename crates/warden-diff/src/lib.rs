//! Source reconciliation: diffs freshly discovered objects against what the
//! control plane already knows, producing typed mutation batches and the
//! resulting work queue.

pub mod diff;
pub mod mutation;

pub use diff::diff_source;
pub use mutation::{ChunkMutation, ObjectMutation, SourceDiff};
