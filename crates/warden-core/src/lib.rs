//! Shared data model for the WardenScan sensitive-data scanner.
//!
//! This crate has no I/O and no async runtime dependency: it is the
//! vocabulary every other crate in the workspace (classifiers, connectors,
//! the diff engine, the control-plane client, the pipeline, the scheduler)
//! builds on.

pub mod chunk;
pub mod classifier;
pub mod finding;
pub mod object;
pub mod source;
pub mod status;

pub use chunk::{Chunk, ChunkKind, OVERLAP_BYTES, SENSITIVE_DATA_CHUNK};
pub use classifier::{Classifier, ClassifierCategory, ClassifierConfigError, ClassifierKind, EngineKind, Sensitivity};
pub use finding::Finding;
pub use object::{ObjectRecord, Ownership};
pub use source::{ServiceKind, Source};
pub use status::Status;
