//! bridge-engine: the Approval Registry, Permission Arbiter, Response
//! Writer, and Command Handler — everything downstream of the broker
//! transport that mediates one command's agent invocation and its
//! interleaved tool-approval round-trips.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent;
pub mod arbiter;
pub mod claude_agent;
pub mod command_handler;
pub mod credential;
pub mod error;
pub mod registry;
pub mod writer;

pub use agent::{Agent, AgentOptions, PermissionCallback, PermissionMode, ToolDecision};
pub use arbiter::PermissionArbiter;
pub use claude_agent::ClaudeCodeAgent;
pub use command_handler::CommandHandler;
pub use credential::{CredentialProbe, RealCredentialProbe};
pub use error::EngineError;
pub use registry::{ApprovalOutcome, ApprovalRegistry, RegistryError};
pub use writer::{MqttResponseWriter, ResponseWriter};
