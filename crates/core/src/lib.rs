//! bridge-core: configuration, identifiers, and credential probing shared
//! by every crate in the MQTT agent bridge.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod credentials;
pub mod ids;

pub use config::BridgeConfig;
pub use credentials::agent_is_authenticated;
pub use ids::new_request_id;
