//! bridge-wire: the JSON payload shapes exchanged over MQTT between a
//! device and the bridge, independent of how either side transports them.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod approval;
pub mod command;
pub mod response;
pub mod status;

pub use approval::{ApprovalInput, ApprovalRequest, ApprovalResponse};
pub use command::CommandEnvelope;
pub use response::{ResponseContext, ResponseEvent};
pub use status::Liveness;
