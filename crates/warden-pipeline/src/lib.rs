//! Per-chunk scan pipeline: lease acquisition, fetch, classification, and
//! finalisation.

pub mod hashing;
pub mod lease;
pub mod pipeline;

pub use hashing::{hash_chunk_body, hash_finding_content};
pub use lease::LeaseBroker;
pub use pipeline::{classify_columns, scan_chunk, PipelineCtx, ScanOutcome};
