//! Connector error taxonomy (spec §7): every connector error classifies as
//! transient, an auth failure, not-found, or permanent, so callers can
//! retry or give up without inspecting error internals.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("authentication failed for source {0}")]
    Auth(String),

    #[error("transient connector failure: {0}")]
    Transient(String),

    #[error("permanent connector failure: {0}")]
    Permanent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid connector configuration: {0}")]
    Config(String),
}

impl ConnectError {
    /// Whether a retry is worth attempting without operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConnectError::Transient(_) | ConnectError::Io(_))
    }

    /// Whether this error should halt the scan for this source rather than
    /// be retried (spec §7 `Permanent`/`Auth`/`NotFound` share this fate at
    /// the object level, even though they're surfaced distinctly).
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}

pub type ConnectResult<T> = Result<T, ConnectError>;
