//! Root error type composing every crate's error enum (spec §7), the way
//! the teacher's `OrbitError` wraps subsystem errors behind one type the
//! binary can match on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WardenError>;

#[derive(Debug, Error)]
pub enum WardenError {
    #[error(transparent)]
    Connect(#[from] warden_connect::ConnectError),

    #[error(transparent)]
    Classify(#[from] warden_classify::ClassifyError),

    #[error(transparent)]
    Client(#[from] warden_client::ClientError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("instance identity bootstrap failed: {0}")]
    InstanceIdentity(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WardenError {
    /// Classification matching spec §7's taxonomy
    /// (`Transient | Auth | NotFound | Permanent`): `true` means a retry
    /// without operator intervention is worth attempting.
    pub fn is_transient(&self) -> bool {
        match self {
            WardenError::Connect(e) => e.is_transient(),
            WardenError::Client(e) => e.is_transient(),
            WardenError::Io(_) => true,
            _ => false,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}
