//! The production [`Agent`]: spawns the `claude` CLI in bidirectional
//! stream-json mode and relays its newline-delimited JSON events to the
//! writer, answering `can_use_tool` control requests on stdin as they
//! arrive. Parsing is line-oriented and tolerant, the same shape as the
//! reference stream-json parser this is grounded on: a malformed line is
//! logged and skipped, never fatal to the stream.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::agent::{Agent, AgentOptions, PermissionCallback, ToolDecision};
use crate::error::EngineError;
use crate::writer::ResponseWriter;

pub struct ClaudeCodeAgent {
    cli_path: String,
}

impl ClaudeCodeAgent {
    pub fn new(cli_path: impl Into<String>) -> Self {
        Self { cli_path: cli_path.into() }
    }
}

#[async_trait]
impl Agent for ClaudeCodeAgent {
    async fn query(
        &self,
        message: &str,
        options: AgentOptions,
        writer: Arc<dyn ResponseWriter>,
        permission: Arc<dyn PermissionCallback>,
    ) -> Result<(), EngineError> {
        let mut command = Command::new(&self.cli_path);
        command
            .arg("--print")
            .arg(message)
            .arg("--input-format")
            .arg("stream-json")
            .arg("--output-format")
            .arg("stream-json")
            .arg("--permission-mode")
            .arg(options.permission_mode.as_str())
            .current_dir(&options.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(session_id) = &options.session_id {
            command.arg("--resume").arg(session_id);
        }

        let mut child = command
            .spawn()
            .map_err(|e| EngineError::AgentFailure(format!("failed to spawn {}: {e}", self.cli_path)))?;

        let mut stdin =
            child.stdin.take().ok_or_else(|| EngineError::AgentFailure("agent stdin unavailable".to_string()))?;
        let stdout =
            child.stdout.take().ok_or_else(|| EngineError::AgentFailure("agent stdout unavailable".to_string()))?;

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) =
            lines.next_line().await.map_err(|e| EngineError::AgentFailure(format!("reading agent stdout: {e}")))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, line, "malformed stream-json line from agent, skipping");
                    continue;
                }
            };

            if let Some(response) = handle_control_request(&value, permission.as_ref()).await {
                let mut payload = serde_json::to_vec(&response)
                    .map_err(|e| EngineError::AgentFailure(format!("encoding control response: {e}")))?;
                payload.push(b'\n');
                stdin
                    .write_all(&payload)
                    .await
                    .map_err(|e| EngineError::AgentFailure(format!("writing control response: {e}")))?;
                continue;
            }

            writer.send(value).await?;
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::AgentFailure(format!("waiting for agent process: {e}")))?;
        if !status.success() {
            return Err(EngineError::AgentFailure(format!("agent exited with status {status}")));
        }
        debug!("agent process exited cleanly");
        Ok(())
    }
}

/// Recognizes a `control_request` event of subtype `can_use_tool`, runs it
/// through `permission`, and builds the matching `control_response`. Any
/// other event shape returns `None` so the caller forwards it untouched.
async fn handle_control_request(value: &Value, permission: &dyn PermissionCallback) -> Option<Value> {
    if value.get("type")?.as_str()? != "control_request" {
        return None;
    }
    let request = value.get("request")?;
    if request.get("subtype")?.as_str()? != "can_use_tool" {
        return None;
    }
    let request_id = value.get("request_id")?.as_str()?.to_string();
    let tool_name = request.get("tool_name")?.as_str()?.to_string();
    let tool_input = request.get("input").cloned().unwrap_or(Value::Null);

    let decision = permission.can_use_tool(&tool_name, tool_input).await;
    let response = match decision {
        ToolDecision::Allow { updated_input } => {
            json!({"behavior": "allow", "updatedInput": updated_input})
        }
        ToolDecision::Deny { message } => json!({"behavior": "deny", "message": message}),
    };

    Some(json!({
        "type": "control_response",
        "response": {
            "request_id": request_id,
            "response": response,
        }
    }))
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use tokio::sync::Mutex;

    /// One step of a scripted agent run: either a plain event to forward,
    /// or a tool-use that must go through `permission` first.
    pub enum FakeStep {
        Event(Value),
        ToolUse { tool_name: String, tool_input: Value },
    }

    /// A scripted [`Agent`] double: replays a fixed sequence of events and
    /// tool-use checks, recording the cwd/session id it was invoked with.
    pub struct FakeAgent {
        steps: Vec<FakeStep>,
        last_options: Mutex<Option<AgentOptions>>,
    }

    impl FakeAgent {
        pub fn new(steps: Vec<FakeStep>) -> Self {
            Self { steps, last_options: Mutex::new(None) }
        }

        pub async fn last_cwd(&self) -> Option<std::path::PathBuf> {
            self.last_options.lock().await.as_ref().map(|o| o.cwd.clone())
        }
    }

    #[async_trait]
    impl Agent for FakeAgent {
        async fn query(
            &self,
            _message: &str,
            options: AgentOptions,
            writer: Arc<dyn ResponseWriter>,
            permission: Arc<dyn PermissionCallback>,
        ) -> Result<(), EngineError> {
            *self.last_options.lock().await = Some(options);
            for step in &self.steps {
                match step {
                    FakeStep::Event(event) => writer.send(event.clone()).await?,
                    FakeStep::ToolUse { tool_name, tool_input } => {
                        let decision = permission.can_use_tool(tool_name, tool_input.clone()).await;
                        let event = match decision {
                            ToolDecision::Allow { .. } => json!({"data": {"type": "tool_result", "ok": true}}),
                            ToolDecision::Deny { message } => {
                                json!({"data": {"type": "tool_result", "ok": false, "message": message}})
                            }
                        };
                        writer.send(event).await?;
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgent, FakeStep};

#[cfg(test)]
#[path = "claude_agent_tests.rs"]
mod tests;
