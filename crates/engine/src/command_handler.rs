//! The Command Handler: the entry point for every inbound command
//! envelope. Parses it, enforces the (informational) single-active-command
//! discipline, validates preconditions, and wires a fresh Response Writer
//! and Permission Arbiter to one agent invocation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bridge_broker::Publisher;
use bridge_core::BridgeConfig;
use bridge_wire::{CommandEnvelope, ResponseContext, ResponseEvent};
use tracing::{error, info, warn};

use crate::agent::{Agent, AgentOptions, PermissionMode};
use crate::arbiter::PermissionArbiter;
use crate::credential::CredentialProbe;
use crate::error::EngineError;
use crate::registry::ApprovalRegistry;
use crate::writer::MqttResponseWriter;

pub struct CommandHandler {
    response_topic: String,
    approval_request_topic: String,
    approval_timeout_ms: u64,
    agent_workspace_root: PathBuf,
    registry: Arc<ApprovalRegistry>,
    publisher: Arc<dyn Publisher>,
    agent: Arc<dyn Agent>,
    credential_probe: Arc<dyn CredentialProbe>,
    /// Purely informational per the design note: a new command proceeds
    /// even if one is already marked active. Only the registry's
    /// `cancel_all` actually enforces anything.
    active: AtomicBool,
}

impl CommandHandler {
    pub fn new(
        config: &BridgeConfig,
        registry: Arc<ApprovalRegistry>,
        publisher: Arc<dyn Publisher>,
        agent: Arc<dyn Agent>,
        credential_probe: Arc<dyn CredentialProbe>,
    ) -> Self {
        Self {
            response_topic: config.response_topic.clone(),
            approval_request_topic: config.approval_request_topic.clone(),
            approval_timeout_ms: config.approval_timeout_ms,
            agent_workspace_root: config.agent_workspace_root.clone(),
            registry,
            publisher,
            agent,
            credential_probe,
            active: AtomicBool::new(false),
        }
    }

    pub async fn handle(&self, envelope: CommandEnvelope) {
        let session_id = envelope.session_id.clone().unwrap_or_else(|| self.registry.new_request_id());
        let source_device = envelope.source.clone();

        // Unconditional: cancel_all is already a safe no-op on an empty
        // registry, and gating it on a prior count() check would leave a
        // window where a concurrently-registered approval is never
        // preempted.
        self.registry.cancel_all("New command received").await;
        self.active.store(true, Ordering::SeqCst);

        let message = match &envelope.message {
            Some(message) if !message.is_empty() => message.clone(),
            _ => {
                warn!(session_id, "rejecting command: missing message");
                self.publish_error(&session_id, &source_device, EngineError::EnvelopeInvalid.to_string()).await;
                self.active.store(false, Ordering::SeqCst);
                return;
            }
        };

        if !self.credential_probe.is_authenticated() {
            warn!(session_id, "rejecting command: agent not authenticated");
            self.publish_error(&session_id, &source_device, EngineError::CredentialAbsent.to_string()).await;
            self.active.store(false, Ordering::SeqCst);
            return;
        }

        let cwd = match self.resolve_cwd(envelope.project.as_deref()) {
            Ok(cwd) => cwd,
            Err(e) => {
                warn!(session_id, error = %e, "rejecting command: bad working directory hint");
                self.publish_error(&session_id, &source_device, e.to_string()).await;
                self.active.store(false, Ordering::SeqCst);
                return;
            }
        };

        let writer = Arc::new(MqttResponseWriter::new(
            self.publisher.clone(),
            self.response_topic.clone(),
            session_id.clone(),
            source_device.clone(),
            envelope.stream,
        ));
        let arbiter = Arc::new(PermissionArbiter::new(
            self.registry.clone(),
            self.publisher.clone(),
            self.approval_request_topic.clone(),
            self.approval_timeout_ms,
            session_id.clone(),
            source_device.clone(),
        ));

        let options = AgentOptions { cwd, session_id: Some(session_id.clone()), permission_mode: PermissionMode::Default };

        let result = self.agent.query(&message, options, writer.clone(), arbiter).await;
        match result {
            Ok(()) => {
                if let Err(e) = writer.end().await {
                    error!(session_id, error = %e, "failed to publish terminal complete event");
                }
            }
            Err(e) => {
                error!(session_id, error = %e, "agent failed during streaming");
                self.publish_error(&session_id, &source_device, EngineError::AgentFailure(e.to_string()).to_string()).await;
            }
        }

        self.active.store(false, Ordering::SeqCst);
        info!(session_id, "command handling complete");
    }

    fn resolve_cwd(&self, project: Option<&str>) -> Result<PathBuf, EngineError> {
        let candidate = match project {
            None => return Ok(self.agent_workspace_root.clone()),
            Some(project) => project,
        };
        let path = Path::new(candidate);
        let resolved =
            if path.is_absolute() { path.to_path_buf() } else { self.agent_workspace_root.join(path) };
        if resolved.is_dir() {
            Ok(resolved)
        } else {
            Err(EngineError::InvalidWorkingDirectory(candidate.to_string()))
        }
    }

    async fn publish_error(&self, session_id: &str, source_device: &str, message: String) {
        let event = ResponseEvent::Error {
            error: message,
            ctx: ResponseContext { session_id: session_id.to_string(), source_device: source_device.to_string(), timestamp: now_ms() },
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to encode error response event");
                return;
            }
        };
        if let Err(e) = self.publisher.publish(&self.response_topic, payload, false).await {
            error!(error = %e, "failed to publish error response event");
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
#[path = "command_handler_tests.rs"]
mod tests;
