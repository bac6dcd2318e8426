//! The permission-approval request/response pair exchanged with devices
//! when the agent wants to use a tool that needs a human nod.

use serde::{Deserialize, Serialize};

/// Detail shown to the human alongside the approval prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalInput {
    pub command: String,
    pub description: String,
}

/// Published on the approval-request topic when the agent's `canUseTool`
/// callback fires for a tool invocation that isn't auto-approved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub request_id: String,
    pub tool_name: String,
    pub input: ApprovalInput,
    pub session_id: String,
    pub source_device: String,
    pub timestamp: u64,
}

/// Received on the approval-response topic. `approved` must be `true` to
/// grant the tool call; anything else, including its absence, is a denial.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub request_id: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub reason: Option<String>,
}
