use super::*;
use bridge_broker::FakePublisher;
use serde_json::json;

fn new_arbiter(publisher: Arc<FakePublisher>, timeout_ms: u64) -> (Arc<ApprovalRegistry>, PermissionArbiter) {
    let registry = Arc::new(ApprovalRegistry::new());
    let arbiter = PermissionArbiter::new(
        registry.clone(),
        publisher,
        "claude/approval-request".to_string(),
        timeout_ms,
        "s-1".to_string(),
        "t".to_string(),
    );
    (registry, arbiter)
}

#[tokio::test]
async fn approved_response_allows_with_original_input() {
    let publisher = Arc::new(FakePublisher::new());
    let (registry, arbiter) = new_arbiter(publisher.clone(), 1_000);

    let tool_input = json!({"command": "ls", "description": "list files"});
    let call = {
        let input = tool_input.clone();
        async { arbiter.can_use_tool("Bash", input).await }
    };
    let resolve = async {
        tokio::task::yield_now().await;
        let calls = publisher.calls_on("claude/approval-request").await;
        assert_eq!(calls.len(), 1);
        let published: serde_json::Value = serde_json::from_slice(&calls[0].payload).unwrap();
        let request_id = published["requestId"].as_str().unwrap().to_string();
        registry.resolve(&request_id, true, None).await;
    };

    let (decision, _) = tokio::join!(call, resolve);
    match decision {
        ToolDecision::Allow { updated_input } => assert_eq!(updated_input, tool_input),
        ToolDecision::Deny { message } => panic!("expected allow, got deny: {message}"),
    }
}

#[tokio::test]
async fn denied_response_carries_the_reason() {
    let publisher = Arc::new(FakePublisher::new());
    let (registry, arbiter) = new_arbiter(publisher.clone(), 1_000);
    let call = async { arbiter.can_use_tool("Bash", json!({})).await };
    let resolve = async {
        tokio::task::yield_now().await;
        let calls = publisher.calls_on("claude/approval-request").await;
        let published: serde_json::Value = serde_json::from_slice(&calls[0].payload).unwrap();
        let request_id = published["requestId"].as_str().unwrap().to_string();
        registry.resolve(&request_id, false, Some("no".to_string())).await;
    };
    let (decision, _) = tokio::join!(call, resolve);
    match decision {
        ToolDecision::Deny { message } => assert_eq!(message, "no"),
        ToolDecision::Allow { .. } => panic!("expected deny"),
    }
}

#[tokio::test]
async fn timeout_denies_with_a_message_containing_timeout() {
    let publisher = Arc::new(FakePublisher::new());
    let (_registry, arbiter) = new_arbiter(publisher, 20);

    let decision = arbiter.can_use_tool("Bash", json!({})).await;
    match decision {
        ToolDecision::Deny { message } => assert!(message.contains("Approval timeout")),
        ToolDecision::Allow { .. } => panic!("expected deny on timeout"),
    }
}

#[tokio::test]
async fn cancellation_denies_with_the_cancel_reason_folded_in() {
    let publisher = Arc::new(FakePublisher::new());
    let (registry, arbiter) = new_arbiter(publisher.clone(), 1_000);

    let call = async { arbiter.can_use_tool("Bash", json!({})).await };
    let cancel = async {
        tokio::task::yield_now().await;
        let calls = publisher.calls_on("claude/approval-request").await;
        let published: serde_json::Value = serde_json::from_slice(&calls[0].payload).unwrap();
        let request_id = published["requestId"].as_str().unwrap().to_string();
        registry.cancel(&request_id, "New command received").await;
    };
    let (decision, _) = tokio::join!(call, cancel);
    match decision {
        ToolDecision::Deny { message } => assert!(message.contains("New command received")),
        ToolDecision::Allow { .. } => panic!("expected deny on cancellation"),
    }
}
