//! The Permission Arbiter: builds the callback the agent invokes when it
//! needs approval for a tool use, mediating one request/response
//! round-trip over the broker per call.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bridge_broker::Publisher;
use bridge_wire::{ApprovalInput, ApprovalRequest};
use serde_json::Value;
use tracing::warn;

use crate::agent::{PermissionCallback, ToolDecision};
use crate::registry::{ApprovalRegistry, RegistryError};

pub struct PermissionArbiter {
    registry: Arc<ApprovalRegistry>,
    publisher: Arc<dyn Publisher>,
    approval_request_topic: String,
    approval_timeout_ms: u64,
    session_id: String,
    source_device: String,
}

impl PermissionArbiter {
    pub fn new(
        registry: Arc<ApprovalRegistry>,
        publisher: Arc<dyn Publisher>,
        approval_request_topic: String,
        approval_timeout_ms: u64,
        session_id: String,
        source_device: String,
    ) -> Self {
        Self {
            registry,
            publisher,
            approval_request_topic,
            approval_timeout_ms,
            session_id,
            source_device,
        }
    }
}

#[async_trait]
impl PermissionCallback for PermissionArbiter {
    async fn can_use_tool(&self, tool_name: &str, tool_input: Value) -> ToolDecision {
        let request_id = self.registry.new_request_id();

        let request = ApprovalRequest {
            request_id: request_id.clone(),
            tool_name: tool_name.to_string(),
            input: ApprovalInput {
                command: tool_input.get("command").and_then(Value::as_str).unwrap_or_default().to_string(),
                description: tool_input
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            session_id: self.session_id.clone(),
            source_device: self.source_device.clone(),
            timestamp: now_ms(),
        };

        let payload = match serde_json::to_vec(&request) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode approval request, denying tool use");
                return ToolDecision::Deny { message: format!("Approval timeout: {e}") };
            }
        };

        if let Err(e) = self.publisher.publish(&self.approval_request_topic, payload, false).await {
            warn!(error = %e, request_id, "failed to publish approval request, denying tool use");
            return ToolDecision::Deny { message: format!("Approval timeout: {e}") };
        }

        match self.registry.wait(&request_id, self.approval_timeout_ms).await {
            Ok(outcome) if outcome.approved => ToolDecision::Allow { updated_input: tool_input },
            Ok(outcome) => {
                ToolDecision::Deny { message: outcome.reason.unwrap_or_else(|| "Denied by user".to_string()) }
            }
            Err(RegistryError::Timeout(ms)) => {
                ToolDecision::Deny { message: format!("Approval timeout: no response within {ms}ms") }
            }
            Err(RegistryError::Cancelled(reason)) => {
                ToolDecision::Deny { message: format!("Approval timeout: {reason}") }
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
#[path = "arbiter_tests.rs"]
mod tests;
