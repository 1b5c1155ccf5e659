//! Classifier matches reported to the control plane (spec §3, §4.1).

use serde::{Deserialize, Serialize};

/// A classifier match against chunk content, masked and hashed before
/// reporting (spec §3, glossary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub metadata_id: i64,
    pub chunk_id: i64,
    pub classifier_name: String,
    pub region: String,
    /// `0.0..=1.0`; regex engines report a fixed confidence, NER a model
    /// score (spec §4.1).
    pub score: f32,
    pub masked_value: String,
    /// Hex-encoded SHA-384 of the original (unmasked) matched value.
    pub content_hash: String,
    pub column: Option<String>,
}
