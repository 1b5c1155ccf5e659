//! `ControlPlaneClient`: the single HTTP entry point every other crate in
//! the workspace goes through to reach the control plane (spec §4.7, §6).
//!
//! Retry/backoff/auth semantics, grounded in the original's `make_request`:
//! - `401` refreshes the token once and retries once; a second `401` is
//!   reported as [`ClientError::Auth`].
//! - `404`/`422` are "nothing here" — returned as `Ok(None)`, never
//!   retried, never surfaced as an error.
//! - `424` or any `5xx` sleeps one second and retries indefinitely, since
//!   control-plane outages are transient by contract.
//! - write bodies are gzipped JSON; read/delete parameters are
//!   URL-encoded with `None` values dropped.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::gzip::gzip_json;
use crate::token::TokenGuard;

const RETRY_SLEEP: Duration = Duration::from_secs(1);

pub struct ControlPlaneClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenGuard,
}

impl ControlPlaneClient {
    pub fn new(base_url: impl Into<String>, token_url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: TokenGuard::new(token_url, client_id, client_secret),
        }
    }

    async fn bearer_token(&self) -> ClientResult<String> {
        if let Some(token) = self.token.current_token() {
            if !self.token.needs_refresh(chrono::Utc::now()) {
                return Ok(token);
            }
        }
        self.token.refresh(&self.http).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Send one request, applying the full retry/auth/empty-result policy.
    /// `query` parameters with a `None` value are dropped before encoding
    /// (GET/DELETE semantics); `body`, when present, is sent gzipped for
    /// POST/PUT/PATCH.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, Option<String>)],
        body: Option<&Value>,
    ) -> ClientResult<Option<Value>> {
        let mut already_refreshed_once = false;

        loop {
            let token = self.bearer_token().await?;
            let query: Vec<(&str, String)> = query.iter().filter_map(|(k, v)| v.clone().map(|v| (*k, v))).collect();

            let mut request = self
                .http
                .request(method.clone(), self.url(path))
                .bearer_auth(token)
                .query(&query);

            if let Some(body) = body {
                let compressed = gzip_json(body)?;
                request = request
                    .header(reqwest::header::CONTENT_ENCODING, "gzip")
                    .header(reqwest::header::ACCEPT_ENCODING, "gzip")
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(compressed);
            }

            let response = request.send().await?;
            let status = response.status();

            match status {
                StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                    debug!(%status, path, "control plane reported nothing here");
                    return Ok(None);
                }
                StatusCode::UNAUTHORIZED => {
                    if already_refreshed_once {
                        return Err(ClientError::Auth);
                    }
                    warn!(path, "control plane rejected token, refreshing once");
                    self.token.refresh(&self.http).await?;
                    already_refreshed_once = true;
                    continue;
                }
                StatusCode::FAILED_DEPENDENCY => {
                    warn!(path, "control plane dependency failure, retrying in 1s");
                    tokio::time::sleep(RETRY_SLEEP).await;
                    continue;
                }
                s if s.is_server_error() => {
                    warn!(%s, path, "control plane server error, retrying in 1s");
                    tokio::time::sleep(RETRY_SLEEP).await;
                    continue;
                }
                s if s.is_success() => {
                    if s == StatusCode::NO_CONTENT {
                        return Ok(None);
                    }
                    let text = response.text().await?;
                    if text.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(serde_json::from_str(&text)?));
                }
                s => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ClientError::UnexpectedStatus { status: s.as_u16(), body });
                }
            }
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, Option<String>)]) -> ClientResult<Option<Value>> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn delete(&self, path: &str, query: &[(&str, Option<String>)]) -> ClientResult<Option<Value>> {
        self.request(Method::DELETE, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> ClientResult<Option<Value>> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> ClientResult<Option<Value>> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> ClientResult<Option<Value>> {
        self.request(Method::PATCH, path, &[], Some(body)).await
    }

    // --- Typed endpoint surface (spec §6) -----------------------------

    pub async fn create_scanner(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.post("customer_account/scanner", body).await
    }

    pub async fn heartbeat_scanner(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.patch("customer_account/scanner", body).await
    }

    pub async fn users_account_id(&self, aws_account_id: &str) -> ClientResult<Option<Value>> {
        self.get("customer_account/users_account_id", &[("aws_account_id", Some(aws_account_id.to_string()))]).await
    }

    pub async fn cloud_account_credentials(&self, account_id: &str) -> ClientResult<Option<Value>> {
        self.get("customer_account/cloud-account", &[("account_id", Some(account_id.to_string()))]).await
    }

    pub async fn data_classification_groups(&self) -> ClientResult<Option<Value>> {
        self.get("customer_account/data_classification_groups", &[]).await
    }

    pub async fn data_classification_sources(&self, classification_id: &str) -> ClientResult<Option<Value>> {
        self.get(
            "customer_account/data-classification-sources",
            &[("classification_id", Some(classification_id.to_string()))],
        )
        .await
    }

    pub async fn data_classification_filter(&self, query: &[(&str, Option<String>)]) -> ClientResult<Option<Value>> {
        self.get("data-classification/filter", query).await
    }

    pub async fn update_data_classification_last_scanned(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.put("customer_account/data_classification_last_scanned", body).await
    }

    pub async fn data_classifiers_filter(&self, query: &[(&str, Option<String>)]) -> ClientResult<Option<Value>> {
        self.get("customer_account/data-classifiers/filter", query).await
    }

    pub async fn file_metadata_filter(&self, source_id: &str) -> ClientResult<Option<Value>> {
        self.get("customer_account/file-metadata/filter", &[("source_id", Some(source_id.to_string()))]).await
    }

    pub async fn batch_file_metadata(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.post("customer_account/batch-file-metadata", body).await
    }

    pub async fn un_ignore_file_metadata(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.patch("customer_account/not-ignored-file-metadata", body).await
    }

    pub async fn delete_batch_metadata(&self, full_paths: &[String]) -> ClientResult<Option<Value>> {
        let joined = full_paths.join(",");
        self.delete("customer_account/delete-batch-metadata", &[("full_paths", Some(joined))]).await
    }

    pub async fn put_data_chunk(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.put("customer_account/data-chunks", body).await
    }

    pub async fn lease_data_chunk(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.patch("customer_account/data-chunks", body).await
    }

    pub async fn create_data_chunks_batch(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.post("customer_account/data-chunks-batch", body).await
    }

    pub async fn update_data_chunks_batch(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.patch("customer_account/data-chunks-batch", body).await
    }

    pub async fn delete_data_chunks_batch(&self, chunk_ids: &[i64]) -> ClientResult<Option<Value>> {
        let joined = chunk_ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        self.delete("customer_account/data-chunks-batch", &[("chunk_ids", Some(joined))]).await
    }

    pub async fn wait_for_scan_chunks(&self, source_id: &str) -> ClientResult<Option<Value>> {
        self.get("customer_account/data-chunks/filter", &[("source_id", Some(source_id.to_string())), ("status", Some("WAIT_FOR_SCAN".into()))]).await
    }

    pub async fn rescan_candidate_chunks(&self, before: &str) -> ClientResult<Option<Value>> {
        self.get("customer_account/rescan/data-chunks/filter", &[("latest_data_type_before", Some(before.to_string()))]).await
    }

    pub async fn report_sensitive_data(&self, body: &Value) -> ClientResult<Option<Value>> {
        self.post("customer_account/sensitive-data", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_against(server: &MockServer) -> ControlPlaneClient {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t1", "expires_in": 3600})))
            .mount(server)
            .await;
        ControlPlaneClient::new(server.uri(), format!("{}/token", server.uri()), "id", "secret")
    }

    #[tokio::test]
    async fn not_found_returns_none_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = client_against(&server).await;
        let result = client.get("thing", &[]).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn success_returns_parsed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;
        let client = client_against(&server).await;
        let result = client.get("thing", &[]).await.unwrap();
        assert_eq!(result, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn server_error_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;
        let client = client_against(&server).await;
        let result = client.get("thing", &[]).await.unwrap();
        assert_eq!(result, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn two_consecutive_401s_surface_as_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let client = client_against(&server).await;
        let err = client.get("thing", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Auth));
    }
}
