//! Multi-engine classifier pipeline: compiles the classifier catalog into
//! four sub-engines, scans chunk text, masks matches, and flags PHI.

pub mod catalog;
pub mod engines;
pub mod error;
pub mod masking;
pub mod phi;
pub mod pipeline;
pub mod region;

pub use catalog::{builtin_catalog, CATALOG_VERSION};
pub use engines::{BacktrackEngine, Engine, MassRegexEngine, NerEngine, RawMatch, Re2Engine};
pub use error::ClassifyError;
pub use masking::mask_finding;
pub use phi::is_phi;
pub use pipeline::ClassifierPipeline;
pub use region::classify_region;
