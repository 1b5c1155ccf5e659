//! `ControlPlaneLeaseBroker` against a mocked control plane: a granted
//! lease PATCH returns a body, a lost lease returns 422, and release
//! posts the scan result without expecting a reply body.

use std::sync::Arc;

use serde_json::json;
use warden_client::ControlPlaneClient;
use warden_pipeline::lease::LeaseBroker;
use wardenscan::run::ControlPlaneLeaseBroker;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_against(server: &MockServer) -> Arc<ControlPlaneClient> {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t1", "expires_in": 3600})))
        .mount(server)
        .await;
    Arc::new(ControlPlaneClient::new(
        server.uri(),
        format!("{}/token", server.uri()),
        "id",
        "secret",
    ))
}

#[tokio::test]
async fn granted_lease_returns_true() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/customer_account/data-chunks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "IN_PROGRESS"})))
        .mount(&server)
        .await;
    let broker = ControlPlaneLeaseBroker::new(client_against(&server).await);
    assert!(broker.try_lease(42).await);
}

#[tokio::test]
async fn lease_already_taken_returns_false() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/customer_account/data-chunks"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;
    let broker = ControlPlaneLeaseBroker::new(client_against(&server).await);
    assert!(!broker.try_lease(42).await);
}

#[tokio::test]
async fn release_posts_scan_result() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/customer_account/data-chunks-batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": 1})))
        .mount(&server)
        .await;
    let broker = ControlPlaneLeaseBroker::new(client_against(&server).await);
    broker.release(42, chrono::Utc::now(), "deadbeef".to_string()).await;
}
