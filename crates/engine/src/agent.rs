//! The seam between the engine and the external agent process. The
//! distilled contract treats the agent as a bare `query(message, options,
//! writer)` function; this crate makes that an explicit trait so the
//! command handler can be tested against an in-memory double instead of a
//! real `claude` subprocess.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;
use crate::writer::ResponseWriter;

/// Always `"default"` — every tool use is routed through [`PermissionCallback`]
/// rather than auto-approved. Kept as an enum rather than a bare string so
/// a future mode doesn't silently change meaning under an existing caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    Default,
}

impl PermissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
        }
    }
}

/// Per-invocation options passed to [`Agent::query`].
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub cwd: PathBuf,
    pub session_id: Option<String>,
    pub permission_mode: PermissionMode,
}

/// The outcome of a permission check, returned to the agent for one tool
/// invocation.
#[derive(Debug, Clone)]
pub enum ToolDecision {
    Allow { updated_input: Value },
    Deny { message: String },
}

/// Invoked by the agent once per tool use that requires approval.
#[async_trait]
pub trait PermissionCallback: Send + Sync {
    async fn can_use_tool(&self, tool_name: &str, tool_input: Value) -> ToolDecision;
}

/// An external, streaming collaborator: consumes a natural-language
/// message, emits structured events to `writer`, and occasionally pauses
/// for a tool-use decision from `permission`.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn query(
        &self,
        message: &str,
        options: AgentOptions,
        writer: Arc<dyn ResponseWriter>,
        permission: Arc<dyn PermissionCallback>,
    ) -> Result<(), EngineError>;
}
