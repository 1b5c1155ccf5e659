//! Connector capability boundary: a `Connector` trait, chunk-plan math, and
//! the local/mock connectors the pipeline and tests run against.

pub mod archive;
pub mod config;
pub mod connector;
pub mod error;
pub mod local;
pub mod mock;
pub mod plan;

pub use archive::{cache_dir_for, expand, has_sufficient_disk, uncompressed_total, ExtractedMember};
pub use config::ServiceConfig;
pub use connector::{Connector, FetchedRange};
pub use error::{ConnectError, ConnectResult};
pub use local::LocalFsConnector;
pub use mock::MockConnector;
