//! Scanner instance identity: in test mode a synthetic id, otherwise the
//! EC2 instance identity document, fetched with linear backoff.

use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::warn;

use crate::error::{Result, WardenError};

const INSTANCE_IDENTITY_URL: &str = "http://169.254.169.254/latest/dynamic/instance-identity/document";
const MAX_ATTEMPTS: u32 = 10;

#[derive(serde::Deserialize)]
struct InstanceIdentityDocument {
    #[serde(rename = "instanceId")]
    instance_id: String,
}

fn synthetic_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(17)
        .map(char::from)
        .collect();
    format!("test-{suffix}")
}

/// Resolve this scanner's instance identity (spec §6 `SCANNER_ID`). In test
/// mode this returns a locally generated id without any network call; in
/// develop mode it queries the EC2 metadata service, retrying with a
/// `10 * attempt` second linear backoff up to [`MAX_ATTEMPTS`] times.
pub async fn resolve_scanner_id(http: &reqwest::Client, test_mode: bool) -> Result<String> {
    if test_mode {
        return Ok(synthetic_id());
    }

    let mut attempt = 0u32;
    loop {
        if attempt > MAX_ATTEMPTS {
            return Err(WardenError::InstanceIdentity(
                "exceeded maximum instance identity lookup attempts".to_string(),
            ));
        }

        match fetch_instance_id(http).await {
            Ok(id) => return Ok(id),
            Err(e) => {
                warn!(error = %e, attempt, "failed to fetch instance identity document");
                tokio::time::sleep(std::time::Duration::from_secs(u64::from(attempt) * 10)).await;
                attempt += 1;
            }
        }
    }
}

async fn fetch_instance_id(http: &reqwest::Client) -> Result<String> {
    let response = http
        .get(INSTANCE_IDENTITY_URL)
        .send()
        .await
        .map_err(|e| WardenError::InstanceIdentity(e.to_string()))?;
    let document: InstanceIdentityDocument = response
        .json()
        .await
        .map_err(|e| WardenError::InstanceIdentity(e.to_string()))?;
    Ok(document.instance_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mode_never_hits_the_network() {
        let http = reqwest::Client::new();
        let id = resolve_scanner_id(&http, true).await.unwrap();
        assert!(id.starts_with("test-"));
        assert_eq!(id.len(), "test-".len() + 17);
    }

    #[test]
    fn synthetic_ids_are_lowercase_alphanumeric() {
        let id = synthetic_id();
        let suffix = id.strip_prefix("test-").unwrap();
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
