use thiserror::Error;

/// Broker-transient failures: connect, subscribe, or publish. All are
/// logged by the caller; none of them tear the process down.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid broker url {0:?}: {1}")]
    InvalidUrl(String, &'static str),

    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("subscribe to {topic} timed out")]
    SubscribeTimeout { topic: String },

    #[error("publish to {topic} timed out")]
    PublishTimeout { topic: String },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
