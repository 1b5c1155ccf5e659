//! Classifier catalog types (spec §3, §4.1).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which sub-engine compiles and runs a classifier's patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineKind {
    /// All patterns with this flag compile into one multi-pattern automaton.
    Hyperscan,
    /// Linear-time, one-pattern-at-a-time engine.
    Re2,
    /// Full backtracking engine, one pattern at a time.
    Re,
    /// Named-entity recognition model (reserved classifier id 0).
    Ner,
}

/// Whether a classifier's matches select content in (`Include`) or exclude
/// content from (`Exclude`) the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifierCategory {
    Include,
    Exclude,
}

/// Whether a classifier matches chunk content (`Data`) or object names
/// (`Filename`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifierKind {
    Data,
    Filename,
}

/// Sensitivity tier attached to a classifier, surfaced verbatim on findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
    Critical,
}

/// A named pattern (or NER model) recognizing a data category.
///
/// `Exclude` + `Data` is an invalid combination — see
/// [`Classifier::new`] — because an exclusion classifier only makes sense
/// against filenames (the data-content exclusion path does not exist in the
/// pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    pub id: i64,
    pub name: String,
    pub engine: EngineKind,
    pub patterns: Vec<String>,
    pub category: ClassifierCategory,
    pub kind: ClassifierKind,
    pub labels: Vec<String>,
    pub sensitivity: Sensitivity,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierConfigError {
    #[error("classifier {name:?} is invalid: EXCLUDE category cannot be combined with DATA kind")]
    ExcludeData { name: String },
    #[error("classifier {name:?} has no patterns")]
    NoPatterns { name: String },
}

impl Classifier {
    /// Construct a classifier, rejecting the `Exclude` + `Data` combination
    /// at configuration load time (spec §3 invariant, §7 "invariant
    /// violation rejected at configuration load").
    pub fn new(
        id: i64,
        name: impl Into<String>,
        engine: EngineKind,
        patterns: Vec<String>,
        category: ClassifierCategory,
        kind: ClassifierKind,
        labels: Vec<String>,
        sensitivity: Sensitivity,
    ) -> Result<Self, ClassifierConfigError> {
        let name = name.into();
        if category == ClassifierCategory::Exclude && kind == ClassifierKind::Data {
            return Err(ClassifierConfigError::ExcludeData { name });
        }
        if patterns.is_empty() && engine != EngineKind::Ner {
            return Err(ClassifierConfigError::NoPatterns { name });
        }
        Ok(Self {
            id,
            name,
            engine,
            patterns,
            category,
            kind,
            labels,
            sensitivity,
        })
    }

    /// The reserved classifier id assigned to the NER person-name model.
    pub const NER_CLASSIFIER_ID: i64 = 0;

    /// Whether this classifier belongs to the credentials family (by naming
    /// convention: its name ends in `_CREDENTIALS`, or is a well-known
    /// secret-shaped classifier such as `OPENAI_KEY` or `SSH_KEYS`).
    pub fn is_credential_family(&self) -> bool {
        self.name.ends_with("_CREDENTIALS") || self.name.ends_with("_KEY") || self.name.ends_with("_KEYS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(category: ClassifierCategory, kind: ClassifierKind) -> Result<Classifier, ClassifierConfigError> {
        Classifier::new(
            1,
            "US_SSN",
            EngineKind::Re2,
            vec![r"\d{3}-\d{2}-\d{4}".into()],
            category,
            kind,
            vec![],
            Sensitivity::High,
        )
    }

    #[test]
    fn exclude_data_is_rejected() {
        let err = sample(ClassifierCategory::Exclude, ClassifierKind::Data).unwrap_err();
        assert_eq!(err, ClassifierConfigError::ExcludeData { name: "US_SSN".into() });
    }

    #[test]
    fn include_data_is_accepted() {
        assert!(sample(ClassifierCategory::Include, ClassifierKind::Data).is_ok());
    }

    #[test]
    fn exclude_filename_is_accepted() {
        assert!(sample(ClassifierCategory::Exclude, ClassifierKind::Filename).is_ok());
    }

    #[test]
    fn credential_family_detection() {
        let c = Classifier::new(
            2,
            "AWS_CREDENTIALS",
            EngineKind::Hyperscan,
            vec!["aws.*".into()],
            ClassifierCategory::Include,
            ClassifierKind::Data,
            vec![],
            Sensitivity::Critical,
        )
        .unwrap();
        assert!(c.is_credential_family());
    }

    #[test]
    fn ssh_keys_is_credential_family() {
        let c = Classifier::new(
            3,
            "SSH_KEYS",
            EngineKind::Re2,
            vec!["-----BEGIN .* PRIVATE KEY-----".into()],
            ClassifierCategory::Include,
            ClassifierKind::Data,
            vec![],
            Sensitivity::Critical,
        )
        .unwrap();
        assert!(c.is_credential_family());
    }
}
