//! Outbound events published on the response topic while the agent works
//! through a command.

use serde::Serialize;
use serde_json::Value;

/// Fields common to every response event.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseContext {
    pub session_id: String,
    pub source_device: String,
    pub timestamp: u64,
}

/// One event in the response stream for a command. Tagged by `type` so a
/// device can dispatch on the wire shape without knowing the Rust types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseEvent {
    /// A partial piece of the agent's output, emitted as it streams in.
    Chunk {
        content: Value,
        #[serde(flatten)]
        ctx: ResponseContext,
    },
    /// The agent's final natural-language answer, sent once per command
    /// ahead of `complete` regardless of streaming mode.
    Answer {
        text: String,
        #[serde(flatten)]
        ctx: ResponseContext,
    },
    /// Marks the end of a command's response stream.
    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
        duration_ms: u64,
        #[serde(flatten)]
        ctx: ResponseContext,
    },
    /// The agent failed to produce a response.
    Error {
        error: String,
        #[serde(flatten)]
        ctx: ResponseContext,
    },
}
