//! Control-plane error taxonomy (spec §7): transient/auth/not-found/
//! permanent, mirroring the classification every other crate's error enum
//! in this workspace exposes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("control plane request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed after token refresh retry")]
    Auth,

    #[error("failed to acquire access token: {0}")]
    TokenAcquisition(String),

    #[error("control plane returned an unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to (de)serialize control-plane payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid control-plane base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
