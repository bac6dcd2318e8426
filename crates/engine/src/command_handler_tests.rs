use super::*;
use bridge_broker::FakePublisher;
use bridge_core::BridgeConfig;
use serde_json::{json, Value};

use crate::claude_agent::fake::{FakeAgent, FakeStep};
use crate::credential::FixedCredentialProbe;
use crate::registry::RegistryError;

fn test_config(workspace_root: std::path::PathBuf) -> BridgeConfig {
    BridgeConfig {
        enabled: true,
        broker_url: "mqtt://localhost:1883".to_string(),
        client_id: "test-client".to_string(),
        username: None,
        password: None,
        command_topic: "claude/command".to_string(),
        response_topic: "claude/home/response".to_string(),
        approval_request_topic: "claude/approval-request".to_string(),
        approval_response_topic: "claude/approval-response".to_string(),
        status_topic: "claude/home/status".to_string(),
        approval_timeout_ms: 1_000,
        reconnect_backoff_ms: 5_000,
        agent_workspace_root: workspace_root,
        claude_cli_path: "claude".to_string(),
    }
}

fn decode(call: &bridge_broker::publisher::fake::PublishCall) -> Value {
    serde_json::from_slice(&call.payload).unwrap()
}

#[tokio::test]
async fn missing_message_publishes_an_error_and_never_invokes_the_agent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let publisher = Arc::new(FakePublisher::new());
    let agent = Arc::new(FakeAgent::new(vec![]));
    let handler = CommandHandler::new(
        &config,
        Arc::new(ApprovalRegistry::new()),
        publisher.clone(),
        agent.clone(),
        Arc::new(FixedCredentialProbe(true)),
    );

    handler.handle(CommandEnvelope { message: None, session_id: None, source: "t".to_string(), project: None, stream: true }).await;

    let calls = publisher.calls_on("claude/home/response").await;
    assert_eq!(calls.len(), 1);
    let event = decode(&calls[0]);
    assert_eq!(event["type"], "error");
    assert_eq!(event["error"], "Missing required field: message");
    assert!(agent.last_cwd().await.is_none());
}

#[tokio::test]
async fn missing_credentials_publishes_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let publisher = Arc::new(FakePublisher::new());
    let agent = Arc::new(FakeAgent::new(vec![]));
    let handler = CommandHandler::new(
        &config,
        Arc::new(ApprovalRegistry::new()),
        publisher.clone(),
        agent.clone(),
        Arc::new(FixedCredentialProbe(false)),
    );

    handler
        .handle(CommandEnvelope {
            message: Some("2+2?".to_string()),
            session_id: None,
            source: "t".to_string(),
            project: None,
            stream: true,
        })
        .await;

    let calls = publisher.calls_on("claude/home/response").await;
    assert_eq!(calls.len(), 1);
    let event = decode(&calls[0]);
    assert_eq!(event["type"], "error");
    assert!(event["error"].as_str().unwrap().contains("not authenticated"));
    assert!(agent.last_cwd().await.is_none());
}

#[tokio::test]
async fn project_hint_that_does_not_resolve_to_a_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let publisher = Arc::new(FakePublisher::new());
    let agent = Arc::new(FakeAgent::new(vec![]));
    let handler = CommandHandler::new(
        &config,
        Arc::new(ApprovalRegistry::new()),
        publisher.clone(),
        agent.clone(),
        Arc::new(FixedCredentialProbe(true)),
    );

    handler
        .handle(CommandEnvelope {
            message: Some("2+2?".to_string()),
            session_id: None,
            source: "t".to_string(),
            project: Some("no-such-subdir".to_string()),
            stream: true,
        })
        .await;

    let calls = publisher.calls_on("claude/home/response").await;
    assert_eq!(calls.len(), 1);
    let event = decode(&calls[0]);
    assert_eq!(event["type"], "error");
    assert!(event["error"].as_str().unwrap().contains("does not resolve to an existing directory"));
}

#[tokio::test]
async fn batched_command_completes_with_the_agent_events_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let publisher = Arc::new(FakePublisher::new());
    let agent = Arc::new(FakeAgent::new(vec![FakeStep::Event(
        json!({"data": {"type": "result", "result": "4"}}),
    )]));
    let handler = CommandHandler::new(
        &config,
        Arc::new(ApprovalRegistry::new()),
        publisher.clone(),
        agent.clone(),
        Arc::new(FixedCredentialProbe(true)),
    );

    handler
        .handle(CommandEnvelope {
            message: Some("2+2?".to_string()),
            session_id: None,
            source: "t".to_string(),
            project: None,
            stream: false,
        })
        .await;

    let calls = publisher.calls_on("claude/home/response").await;
    assert_eq!(calls.len(), 1);
    let event = decode(&calls[0]);
    assert_eq!(event["type"], "complete");
    assert_eq!(event["content"].as_array().unwrap().len(), 1);
    assert_eq!(event["content"][0]["data"]["result"], "4");
    assert_eq!(event["source_device"], "t");
    assert_eq!(agent.last_cwd().await.unwrap(), dir.path());
}

#[tokio::test]
async fn a_new_command_preempts_any_approval_pending_from_a_prior_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().to_path_buf());
    let publisher = Arc::new(FakePublisher::new());
    let registry = Arc::new(ApprovalRegistry::new());
    let agent = Arc::new(FakeAgent::new(vec![]));
    let handler = CommandHandler::new(
        &config,
        registry.clone(),
        publisher.clone(),
        agent.clone(),
        Arc::new(FixedCredentialProbe(true)),
    );

    let stale_id = registry.new_request_id();
    let waiter = {
        let registry = registry.clone();
        let stale_id = stale_id.clone();
        tokio::spawn(async move { registry.wait(&stale_id, 5_000).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(registry.count().await, 1);

    handler
        .handle(CommandEnvelope {
            message: Some("new command".to_string()),
            session_id: None,
            source: "t".to_string(),
            project: None,
            stream: true,
        })
        .await;

    let outcome = waiter.await.unwrap();
    assert!(matches!(outcome, Err(RegistryError::Cancelled(reason)) if reason == "New command received"));
    assert_eq!(registry.count().await, 0);

    assert!(!registry.resolve(&stale_id, true, None).await);
}
