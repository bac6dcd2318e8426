use thiserror::Error;

/// Failures that can prevent the bridge from starting or keep it from
/// running cleanly. Broker-transient failures never reach this type — they
/// are logged and retried inside `bridge-broker` itself.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Broker(#[from] bridge_broker::BrokerError),
}
