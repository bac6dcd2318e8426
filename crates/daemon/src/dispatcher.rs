//! Topic routing: every inbound message is JSON, dispatched to the Command
//! Handler, the Approval Registry's `resolve`, or dropped, purely by which
//! topic it arrived on.

use std::sync::Arc;

use bridge_core::BridgeConfig;
use bridge_engine::{ApprovalRegistry, CommandHandler};
use bridge_wire::{ApprovalResponse, CommandEnvelope};
use tracing::{info, warn};

/// Dispatches one message at a time; the Command Handler spawns its own
/// task per command so a slow agent invocation never blocks the receive
/// loop from routing the next inbound message (notably an approval
/// response for a *different* in-flight approval).
pub struct Dispatcher {
    command_topic: String,
    approval_response_topic: String,
    registry: Arc<ApprovalRegistry>,
    command_handler: Arc<CommandHandler>,
}

impl Dispatcher {
    pub fn new(config: &BridgeConfig, registry: Arc<ApprovalRegistry>, command_handler: Arc<CommandHandler>) -> Self {
        Self {
            command_topic: config.command_topic.clone(),
            approval_response_topic: config.approval_response_topic.clone(),
            registry,
            command_handler,
        }
    }

    /// Routes one raw inbound payload. Malformed JSON is logged and
    /// dropped; it must never terminate the dispatcher.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) {
        if topic == self.command_topic {
            self.dispatch_command(payload);
        } else if topic == self.approval_response_topic {
            self.dispatch_approval_response(payload).await;
        } else {
            warn!(topic, "message on unrecognized topic, ignoring");
        }
    }

    fn dispatch_command(&self, payload: &[u8]) {
        let envelope: CommandEnvelope = match serde_json::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "malformed command envelope, dropping");
                return;
            }
        };

        let handler = self.command_handler.clone();
        tokio::spawn(async move {
            handler.handle(envelope).await;
        });
    }

    async fn dispatch_approval_response(&self, payload: &[u8]) {
        let response: ApprovalResponse = match serde_json::from_slice(payload) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "malformed approval response, dropping");
                return;
            }
        };

        let resolved = self.registry.resolve(&response.request_id, response.approved, response.reason).await;
        if resolved {
            info!(request_id = response.request_id, "approval response resolved");
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
