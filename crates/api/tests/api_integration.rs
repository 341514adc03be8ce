//! API integration tests.
//!
//! Requests go through the full router over in-memory registries and an
//! agent that accepts everything.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use monitor_agent::{AgentError, InstanceAgent};
use monitor_api::{AppState, health_router, router as api_router};
use monitor_common::{DistributionConfig, MessagesConfig};
use monitor_core::{InstanceService, ServiceMessageService};
use monitor_db::{
    InstanceRepository, KeyedLocks, MessageRepository, ServiceMessage, SharedInstanceStore,
    SharedMessageStore, SofieInstance,
};
use monitor_distribution::{
    DistributionCoordinator, JobScheduler, ProcessorContext, ProcessorRegistry, RetryingExecutor,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct AcceptingAgent;

#[async_trait]
impl InstanceAgent for AcceptingAgent {
    async fn create_message(&self, _: &ServiceMessage, _: &SofieInstance) -> Result<(), AgentError> {
        Ok(())
    }

    async fn recall_message(&self, _: &ServiceMessage, _: &SofieInstance) -> Result<(), AgentError> {
        Ok(())
    }

    async fn get_message(
        &self,
        _: &str,
        _: &SofieInstance,
    ) -> Result<Option<ServiceMessage>, AgentError> {
        Ok(None)
    }
}

/// Create the test router.
fn create_test_router() -> Router {
    let messages: SharedMessageStore = Arc::new(MessageRepository::in_memory());
    let instances: SharedInstanceStore = Arc::new(InstanceRepository::in_memory());
    let agent = Arc::new(AcceptingAgent);
    let locks = KeyedLocks::new();
    let scheduler = JobScheduler::new();

    let registry = ProcessorRegistry::standard(ProcessorContext {
        messages: messages.clone(),
        instances: instances.clone(),
        agent: agent.clone(),
        locks: locks.clone(),
    });
    let coordinator = DistributionCoordinator::new(
        registry,
        RetryingExecutor::new(scheduler.clone()),
        &DistributionConfig::default(),
    );

    let state = AppState {
        message_service: ServiceMessageService::new(
            messages.clone(),
            instances.clone(),
            agent,
            coordinator,
            locks,
            &MessagesConfig::default(),
        ),
        instance_service: InstanceService::new(instances, messages),
        scheduler,
    };

    Router::new()
        .merge(health_router())
        .nest("/api", api_router())
        .with_state(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, url: &str) -> Value {
    let (status, body) = send(app, "POST", "/api/sofieInstances", Some(json!({ "url": url }))).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pendingJobs"], 0);
}

#[tokio::test]
async fn test_instance_registry_endpoints() {
    let app = create_test_router();

    let added = register(&app, "http://studio-a.local/").await;
    let id = added["_id"].as_str().unwrap().to_string();
    assert_eq!(added["name"], "studio-a.local");
    assert_eq!(added["url"], "http://studio-a.local/");

    let (status, body) = send(
        &app,
        "POST",
        "/api/sofieInstances",
        Some(json!({ "url": "http://studio-a.local" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(&app, "GET", "/api/sofieInstances", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", &format!("/api/sofieInstances/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["_id"], id.as_str());

    let (status, _) = send(&app, "DELETE", &format!("/api/sofieInstances/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/sofieInstances/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "INSTANCE_NOT_FOUND");
}

#[tokio::test]
async fn test_service_message_lifecycle() {
    let app = create_test_router();
    register(&app, "http://studio-a.local/").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/serviceMessages",
        Some(json!({
            "criticality": 1,
            "message": "Outage",
            "messageTarget": "http://studio-a.local/"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["isActive"], true);
    assert_eq!(body["data"]["sender"], "sofie-monitor");
    assert_eq!(body["data"]["distributions"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/serviceMessages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/serviceMessages/{id}"),
        Some(json!({ "criticality": 3, "message": "Resolved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Resolved");
    assert_eq!(body["data"]["criticality"], 3);

    let (status, body) = send(&app, "GET", &format!("/api/serviceMessages/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Resolved");

    let (status, body) = send(&app, "DELETE", &format!("/api/serviceMessages/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
}

#[tokio::test]
async fn test_create_message_rejects_invalid_input() {
    let app = create_test_router();

    let (status, body) = send(
        &app,
        "POST",
        "/api/serviceMessages",
        Some(json!({ "criticality": 1, "message": "Outage", "messageTarget": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        "POST",
        "/api/serviceMessages",
        Some(json!({ "criticality": 9, "message": "Outage", "messageTarget": [] })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_unknown_message_returns_not_found() {
    let app = create_test_router();

    for (method, uri) in [
        ("GET", "/api/serviceMessages/missing"),
        ("DELETE", "/api/serviceMessages/missing"),
        ("POST", "/api/serviceMessages/refreshPublishStates/missing"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["error"]["code"], "MESSAGE_NOT_FOUND");
    }
}
