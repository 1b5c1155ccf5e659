//! Protected Health Information flag (spec §4.1 "PHI flag").
//!
//! This is a cheap, independent signal layered on top of classifier
//! findings: an object name or chunk of text can be flagged `is_phi` even
//! when no individual classifier fired, because the flag looks at
//! health-adjacent vocabulary rather than structured identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

static PHI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\b|_)(health)(\b|_)|medical|immun|pharmacy|disease|patient|insura|(\b|_)(Rh)(\b|_)|MRN|(\b|_)(phi)(\b|_)",
    )
    .expect("PHI pattern is a fixed, known-valid literal")
});

/// Whether `object_name` or `chunk_text` contains health-adjacent
/// vocabulary. Either input alone can trip the flag.
pub fn is_phi(object_name: &str, chunk_text: &str) -> bool {
    PHI_PATTERN.is_match(object_name) || PHI_PATTERN.is_match(chunk_text)
}
