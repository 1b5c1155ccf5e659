//! OAuth client-credentials token lifecycle (spec §6 token endpoint),
//! grounded in the original's `token_refresher` module: the refresh cadence
//! is `2/3 × expires_in`, not the token's actual remaining lifetime, so a
//! refresh always lands comfortably before expiry even under scheduling
//! jitter.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct Held {
    access_token: String,
    refresh_at: DateTime<Utc>,
}

/// Holds the current bearer token and knows when it next needs refreshing.
/// Acquisition itself goes through the HTTP client that owns this guard;
/// `TokenGuard` only tracks state and cadence.
pub struct TokenGuard {
    token_url: String,
    client_id: String,
    client_secret: String,
    held: RwLock<Option<Held>>,
}

impl TokenGuard {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            held: RwLock::new(None),
        }
    }

    /// `expires_in * 2/3` seconds from `now`, per the original cadence.
    pub fn next_refresh_at(now: DateTime<Utc>, expires_in_seconds: i64) -> DateTime<Utc> {
        now + Duration::seconds(expires_in_seconds * 2 / 3)
    }

    pub fn current_token(&self) -> Option<String> {
        self.held.read().expect("token guard lock poisoned").as_ref().map(|h| h.access_token.clone())
    }

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.held.read().expect("token guard lock poisoned").as_ref() {
            Some(held) => now >= held.refresh_at,
            None => true,
        }
    }

    /// Exchange client credentials for a fresh access token and record the
    /// next refresh time.
    pub async fn refresh(&self, http: &reqwest::Client) -> ClientResult<String> {
        let response = http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::TokenAcquisition(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let parsed: TokenResponse = response.json().await?;
        let now = Utc::now();
        let refresh_at = Self::next_refresh_at(now, parsed.expires_in);
        let token = parsed.access_token.clone();
        *self.held.write().expect("token guard lock poisoned") = Some(Held {
            access_token: parsed.access_token,
            refresh_at,
        });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_refresh_at_is_two_thirds_of_expiry() {
        let now = Utc::now();
        let refresh_at = TokenGuard::next_refresh_at(now, 3600);
        assert_eq!(refresh_at, now + Duration::seconds(2400));
    }

    #[test]
    fn no_held_token_always_needs_refresh() {
        let guard = TokenGuard::new("http://example.invalid/token", "id", "secret");
        assert!(guard.needs_refresh(Utc::now()));
        assert!(guard.current_token().is_none());
    }
}
