//! Control-plane HTTP client: typed endpoint methods over a shared
//! retry/auth/gzip request executor.

pub mod client;
pub mod error;
pub mod gzip;
pub mod token;

pub use client::ControlPlaneClient;
pub use error::{ClientError, ClientResult};
pub use token::TokenGuard;
