/*!
 * WardenScan - distributed sensitive-data scanner agent
 *
 * Coordinates discovery, classification, and reporting of sensitive data
 * across configured sources (local filesystem, object storage, managed
 * databases, source control) against a control-plane backend.
 */

pub mod config;
pub mod error;
pub mod instance_id;
pub mod run;

pub use config::{ExecutionMode, SharedSecret, WardenConfig};
pub use error::{Result, WardenError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
