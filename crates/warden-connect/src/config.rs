//! Per-service connector configuration (spec §4.2), parsed by discriminator
//! the way the teacher's backend configuration resolves a URI/tag into one
//! of several credential shapes.

use serde::{Deserialize, Serialize};
use warden_core::ServiceKind;

use crate::error::ConnectError;

/// Tagged union of the credential/connection shape each [`ServiceKind`]
/// needs. Every variant carries just enough to let a real connector
/// implementation open a session; this crate never opens one itself for
/// the five stubbed services (spec §1 "concrete connector adapters... not
/// our problem").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceConfig {
    S3 {
        bucket: String,
        region: String,
        role_arn: Option<String>,
    },
    Redshift {
        cluster_identifier: String,
        database: String,
        role_arn: Option<String>,
    },
    Snowflake {
        account: String,
        database: String,
        warehouse: String,
    },
    Rds {
        instance_identifier: String,
        database: String,
        role_arn: Option<String>,
    },
    DynamoDb {
        table_name: String,
        region: String,
        role_arn: Option<String>,
    },
    DocumentDb {
        cluster_identifier: String,
        database: String,
        role_arn: Option<String>,
    },
    GitHub {
        owner: String,
        repo: String,
        branch: String,
    },
    GitLab {
        project: String,
        branch: String,
    },
    Bitbucket {
        workspace: String,
        repo: String,
        branch: String,
    },
}

impl ServiceConfig {
    pub fn service_kind(&self) -> ServiceKind {
        match self {
            ServiceConfig::S3 { .. } => ServiceKind::S3,
            ServiceConfig::Redshift { .. } => ServiceKind::Redshift,
            ServiceConfig::Snowflake { .. } => ServiceKind::Snowflake,
            ServiceConfig::Rds { .. } => ServiceKind::Rds,
            ServiceConfig::DynamoDb { .. } => ServiceKind::DynamoDb,
            ServiceConfig::DocumentDb { .. } => ServiceKind::DocumentDb,
            ServiceConfig::GitHub { .. } => ServiceKind::GitHub,
            ServiceConfig::GitLab { .. } => ServiceKind::GitLab,
            ServiceConfig::Bitbucket { .. } => ServiceKind::BitBucket,
        }
    }

    /// Parse from the JSON shape the control plane hands back for a
    /// source's connector configuration.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConnectError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ConnectError::Config(format!("invalid service configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn s3_config_round_trips_through_json() {
        let cfg = ServiceConfig::S3 {
            bucket: "my-bucket".into(),
            region: "us-east-1".into(),
            role_arn: None,
        };
        let value = serde_json::to_value(&cfg).unwrap();
        let parsed = ServiceConfig::from_json(&value).unwrap();
        assert_eq!(cfg, parsed);
        assert_eq!(parsed.service_kind(), ServiceKind::S3);
    }

    #[test]
    fn unrecognized_service_tag_is_rejected() {
        let value = json!({"service": "NOT_A_SERVICE"});
        assert!(ServiceConfig::from_json(&value).is_err());
    }
}
