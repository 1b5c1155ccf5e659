//! Errors raised while compiling or running the classifier pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to compile pattern {pattern:?} for classifier {classifier:?}: {source}")]
    PatternCompile {
        classifier: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to compile backtracking pattern {pattern:?} for classifier {classifier:?}: {source}")]
    BacktrackCompile {
        classifier: String,
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
}
