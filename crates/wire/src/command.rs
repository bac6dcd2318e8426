//! The inbound command envelope, published by a device on the command
//! topic to ask the agent to do something.

use serde::Deserialize;

fn default_source() -> String {
    "unknown".to_string()
}

fn default_stream() -> bool {
    true
}

/// A command published on the command-in topic.
///
/// `message` is optional at the wire-parsing layer on purpose: a missing
/// `message` is a valid *envelope*, just an invalid *command* — the
/// distinction matters because the former still gets a proper `{type:
/// "error"}` response, while a payload that isn't even JSON is logged and
/// dropped at the broker layer and never reaches this type.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    /// Opaque session identifier; generated when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Human-readable label for the originating device.
    #[serde(default = "default_source")]
    pub source: String,
    /// Working-directory hint for the agent.
    #[serde(default)]
    pub project: Option<String>,
    /// Whether the response should stream chunk-by-chunk or arrive batched
    /// in a single `complete` event.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_optional_fields_are_absent() {
        let envelope: CommandEnvelope = serde_json::from_str(r#"{"message":"2+2?"}"#).unwrap();
        assert_eq!(envelope.message.as_deref(), Some("2+2?"));
        assert_eq!(envelope.source, "unknown");
        assert!(envelope.session_id.is_none());
        assert!(envelope.project.is_none());
        assert!(envelope.stream);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let raw = r#"{"message":"x","source":"kitchen-hub","session_id":"s-1","project":"/repo","stream":false}"#;
        let envelope: CommandEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.source, "kitchen-hub");
        assert_eq!(envelope.session_id.as_deref(), Some("s-1"));
        assert_eq!(envelope.project.as_deref(), Some("/repo"));
        assert!(!envelope.stream);
    }

    #[test]
    fn missing_message_still_parses_as_an_envelope() {
        let envelope: CommandEnvelope = serde_json::from_str(r#"{"source":"t"}"#).unwrap();
        assert!(envelope.message.is_none());
        assert_eq!(envelope.source, "t");
    }
}
