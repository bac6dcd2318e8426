use async_trait::async_trait;

use crate::error::BrokerError;

/// The seam between anything that needs to put a message on the broker
/// (the dispatcher's liveness publications, the response writer, the
/// permission arbiter) and the concrete transport. Modeled as a trait so
/// tests can substitute an in-memory recorder instead of a live broker.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), BrokerError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// One recorded call to [`Publisher::publish`].
    #[derive(Debug, Clone)]
    pub struct PublishCall {
        pub topic: String,
        pub payload: Vec<u8>,
        pub retain: bool,
    }

    #[derive(Clone, Default)]
    pub struct FakePublisher {
        calls: Arc<Mutex<Vec<PublishCall>>>,
    }

    impl FakePublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn calls(&self) -> Vec<PublishCall> {
            self.calls.lock().await.clone()
        }

        pub async fn calls_on(&self, topic: &str) -> Vec<PublishCall> {
            self.calls
                .lock()
                .await
                .iter()
                .filter(|c| c.topic == topic)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish(
            &self,
            topic: &str,
            payload: Vec<u8>,
            retain: bool,
        ) -> Result<(), BrokerError> {
            self.calls.lock().await.push(PublishCall {
                topic: topic.to_string(),
                payload,
                retain,
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePublisher;
