//! Backend client tests against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clip_backend::{BackendClient, BackendConfig, BackendError, JobBackend};
use clip_models::JobId;

// =============================================================================
// Test Helpers
// =============================================================================

fn client_for(server: &MockServer) -> BackendClient {
    let config = BackendConfig::new(server.uri(), "test-token", "worker-7")
        .with_timeout(Duration::from_secs(2));
    BackendClient::new(config).expect("client should build")
}

// =============================================================================
// Claim
// =============================================================================

#[tokio::test]
async fn test_claim_returns_job_and_sends_identity_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/claim"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("x-worker-id", "worker-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": {
                "id": "j1",
                "type": "VIDEO_CLIP",
                "status": "PROCESSING",
                "payload": { "start": 0, "end": 10 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job = client_for(&server).claim_next().await.unwrap().unwrap();
    assert_eq!(job.id.as_str(), "j1");
    assert_eq!(job.job_type, "VIDEO_CLIP");
}

#[tokio::test]
async fn test_claim_null_job_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/claim"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "job": null })))
        .mount(&server)
        .await;

    assert!(client_for(&server).claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_claim_malformed_body_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/claim"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).claim_next().await.unwrap_err();
    assert!(matches!(err, BackendError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_claim_unauthorized_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/claim"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "unauthorized" })))
        .mount(&server)
        .await;

    let err = client_for(&server).claim_next().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, BackendError::UnexpectedStatus { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_claim_unreachable_backend_is_transport_error() {
    let config = BackendConfig::new("http://127.0.0.1:9", "t", "w")
        .with_timeout(Duration::from_millis(500));
    let client = BackendClient::new(config).unwrap();

    let err = client.claim_next().await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}

// =============================================================================
// Liveness and progress
// =============================================================================

#[tokio::test]
async fn test_heartbeat_posts_to_job_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/j1/heartbeat"))
        .and(header("x-worker-id", "worker-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .report_heartbeat(&JobId::from_string("j1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_heartbeat_conflict_is_reported_to_caller() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/j1/heartbeat"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "error": "job not active" })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .report_heartbeat(&JobId::from_string("j1"))
        .await
        .unwrap_err();

    match err {
        BackendError::UnexpectedStatus { endpoint, status, body } => {
            assert_eq!(endpoint, "heartbeat");
            assert_eq!(status, 409);
            assert!(body.contains("job not active"));
        }
        other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_progress_body_is_clamped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/j1/progress"))
        .and(body_json(json!({ "progress": 100 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .report_progress(&JobId::from_string("j1"), 250)
        .await
        .unwrap();
}

// =============================================================================
// Terminal reports
// =============================================================================

#[tokio::test]
async fn test_complete_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/j1/complete"))
        .and(body_json(json!({
            "status": "COMPLETED",
            "result": { "url": "https://www.youtube.com/watch?v=abc" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .report_complete(
            &JobId::from_string("j1"),
            &json!({ "url": "https://www.youtube.com/watch?v=abc" }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fail_body_goes_to_complete_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/j2/complete"))
        .and(body_json(json!({
            "status": "FAILED",
            "error": "unknown job type: UNKNOWN"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "retried": true })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .report_failed(&JobId::from_string("j2"), "unknown job type: UNKNOWN")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_complete_is_report_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/internal/jobs/j1/complete"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "not job owner" })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .report_complete(&JobId::from_string("j1"), &json!({ "url": "u" }))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Report { status: 403, .. }));
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("not job owner"));
}

#[tokio::test]
async fn test_empty_job_id_fails_without_network_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let empty = JobId::from_string("");

    assert!(matches!(client.report_heartbeat(&empty).await, Err(BackendError::EmptyJobId)));
    assert!(matches!(client.report_progress(&empty, 5).await, Err(BackendError::EmptyJobId)));
    assert!(matches!(
        client.report_complete(&empty, &json!({})).await,
        Err(BackendError::EmptyJobId)
    ));
    assert!(matches!(client.report_failed(&empty, "x").await, Err(BackendError::EmptyJobId)));
}
