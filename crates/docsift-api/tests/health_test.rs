//! Health endpoint integration tests.

mod helpers;

use helpers::{TestAppBuilder, TestBackend};
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn test_health_reports_backend_and_masks_secrets() {
    let app = TestAppBuilder::new(TestBackend::ObjectStore).build();

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "object-store");
    assert_eq!(body["storage"]["status"], "healthy");
    assert_eq!(body["storage"]["config"]["bucket"], "test-bucket");
    assert_eq!(body["keyValueStore"]["status"], "healthy");
    assert_eq!(body["analysis"]["enabled"], true);
    assert_eq!(body["analysis"]["model"], "test-model");

    let raw = response.text();
    assert!(!raw.contains("wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY"));
}

#[tokio::test]
async fn test_health_degraded_when_store_unreachable() {
    let app = TestAppBuilder::new(TestBackend::Inline)
        .kv(Arc::new(helpers::UnreachableStore))
        .build();

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 503);
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["storage"]["status"], "healthy");
    assert!(body["keyValueStore"]["status"]
        .as_str()
        .unwrap()
        .starts_with("unhealthy"));
}
