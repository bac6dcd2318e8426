//! bridge-broker: the Broker Client Adapter. Owns the `rumqttc` session,
//! reconnect/resubscribe handling, and the retained liveness lifecycle.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod error;
pub mod publisher;
pub mod url;

pub use client::{BrokerClient, InboundMessage, MqttPublisher};
pub use error::BrokerError;
pub use publisher::Publisher;

#[cfg(any(test, feature = "test-support"))]
pub use publisher::FakePublisher;
