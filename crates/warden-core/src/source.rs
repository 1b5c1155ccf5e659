//! Scannable source handles (spec §3, glossary).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which external system a [`Source`] lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    S3,
    Redshift,
    Snowflake,
    Rds,
    DynamoDb,
    DocumentDb,
    GitHub,
    BitBucket,
    GitLab,
}

impl ServiceKind {
    /// Human-facing resource-type label, grounded in the original
    /// service-to-connector mapping (`ServicesMapper.native_resource`).
    pub fn native_resource(self) -> &'static str {
        match self {
            ServiceKind::S3 => "SimpleStorageService",
            ServiceKind::Redshift => "RedshiftCluster",
            ServiceKind::Snowflake => "SnowflakeDatabases",
            ServiceKind::Rds => "RelationalDatabaseService",
            ServiceKind::DynamoDb => "DynamoDB",
            ServiceKind::DocumentDb => "DocumentDBCluster",
            ServiceKind::GitHub => "GitHubBranch",
            ServiceKind::BitBucket => "BitBucketBranch",
            ServiceKind::GitLab => "GitLabBranch",
        }
    }

    /// Whether this service exposes row-oriented tabular content.
    pub fn is_tabular(self) -> bool {
        matches!(
            self,
            ServiceKind::Redshift | ServiceKind::Snowflake | ServiceKind::Rds
        )
    }

    /// Whether this service exposes document-oriented content.
    pub fn is_document(self) -> bool {
        matches!(self, ServiceKind::DynamoDb | ServiceKind::DocumentDb)
    }
}

/// Abstract handle identifying a scannable unit: a bucket, a database, a
/// branch, a cluster/db/table triple, etc. The canonical string form is a
/// stable key used for diffing and control-plane reporting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub account_id: String,
    pub service: ServiceKind,
    /// Canonical identifier within `service` — bucket name, `db/schema`,
    /// `owner/repo@branch`, etc.
    pub identifier: String,
}

impl Source {
    pub fn new(account_id: impl Into<String>, service: ServiceKind, identifier: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            service,
            identifier: identifier.into(),
        }
    }

    /// Stable canonical string key, e.g. `123456789012:S3:my-bucket`.
    pub fn canonical(&self) -> String {
        format!("{}:{:?}:{}", self.account_id, self.service, self.identifier)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_stable() {
        let a = Source::new("123", ServiceKind::S3, "bucket-a");
        let b = Source::new("123", ServiceKind::S3, "bucket-a");
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn distinct_identifiers_differ() {
        let a = Source::new("123", ServiceKind::S3, "bucket-a");
        let b = Source::new("123", ServiceKind::S3, "bucket-b");
        assert_ne!(a.canonical(), b.canonical());
    }
}
