use thiserror::Error;

/// Errors raised inside the command pipeline. Every variant except
/// [`EngineError::Registry`]'s timeout case is always surfaced on
/// *response-out*; approval-timeout is confined to a deny result inside
/// the arbiter and never reaches this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Missing required field: message")]
    EnvelopeInvalid,

    #[error("Claude CLI not authenticated: no credentials found at the expected path")]
    CredentialAbsent,

    #[error("project hint {0:?} does not resolve to an existing directory")]
    InvalidWorkingDirectory(String),

    #[error("agent error: {0}")]
    AgentFailure(String),

    #[error(transparent)]
    Broker(#[from] bridge_broker::BrokerError),

    #[error("failed to encode response event: {0}")]
    Encode(#[from] serde_json::Error),
}
