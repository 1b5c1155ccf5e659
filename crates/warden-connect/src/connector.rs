//! The connector capability boundary (spec §4.2): every external system a
//! source lives in is reached through this trait, mirroring the teacher's
//! `Backend` trait boundary (`stat`/`list`/`read`/...).

use async_trait::async_trait;
use warden_core::{ObjectRecord, Source};

use crate::error::ConnectResult;

/// One byte range pulled back from [`Connector::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRange {
    pub data: Vec<u8>,
    /// True when the connector had to expand the requested range (e.g. the
    /// blob overlap rule); callers trim back to the requested window
    /// before hashing if they need the unexpanded bytes.
    pub expanded: bool,
}

/// Capability a scannable source exposes to the rest of the pipeline.
/// Implementations for S3/Redshift/Snowflake/RDS/DynamoDB/DocumentDB/
/// GitHub/GitLab/Bitbucket are out of scope here (spec §1); this crate only
/// defines the boundary and ships connectors a test or the `TEST` run mode
/// can use without live credentials.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Enumerate every object currently present at `source`. A connector
    /// reports what exists *now*; reconciling against previously-known
    /// objects is the diff engine's job, not the connector's.
    async fn discover(&self, source: &Source) -> ConnectResult<Vec<ObjectRecord>>;

    /// Fetch `(offset, limit)` bytes of `fetch_path` within `source`.
    async fn fetch(&self, source: &Source, fetch_path: &str, offset: u64, limit: u64) -> ConnectResult<FetchedRange>;

    /// Whether `a` and `b` address overlapping content and one can be
    /// dropped from the discovered set before diffing (spec §4.2
    /// "exclude redundant" — e.g. a symlink and its target, or a
    /// CDC-replicated duplicate). Default: never redundant.
    fn exclude_redundant(&self, _a: &ObjectRecord, _b: &ObjectRecord) -> bool {
        false
    }

    /// Opaque connector configuration serialized for control-plane
    /// reporting (spec §4.2 "source configuration").
    fn source_configuration(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}
