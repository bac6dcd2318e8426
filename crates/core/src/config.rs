//! Environment-driven configuration for the MQTT agent bridge.
//!
//! Every variable has a default so the bridge runs unconfigured in
//! development; only `MQTT_ENABLED=true` turns it into a live bridge.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Status topic is not configurable — it is always `claude/home/status`.
pub const STATUS_TOPIC: &str = "claude/home/status";

const DEFAULT_BROKER_URL: &str = "mqtt://localhost:1883";
const DEFAULT_COMMAND_TOPIC: &str = "claude/command";
const DEFAULT_RESPONSE_TOPIC: &str = "claude/home/response";
const DEFAULT_APPROVAL_REQUEST_TOPIC: &str = "claude/approval-request";
const DEFAULT_APPROVAL_RESPONSE_TOPIC: &str = "claude/approval-response";
const DEFAULT_APPROVAL_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_RECONNECT_BACKOFF_MS: u64 = 5_000;
const DEFAULT_CLAUDE_CLI_PATH: &str = "claude";

/// Immutable configuration for one bridge process, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub broker_url: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,

    pub command_topic: String,
    pub response_topic: String,
    pub approval_request_topic: String,
    pub approval_response_topic: String,
    pub status_topic: String,

    pub approval_timeout_ms: u64,
    pub reconnect_backoff_ms: u64,

    pub agent_workspace_root: PathBuf,
    pub claude_cli_path: String,
}

impl BridgeConfig {
    /// Build a configuration from the process environment, applying the
    /// documented defaults for anything unset.
    pub fn from_env() -> Self {
        let prefix = std::env::var("MQTT_TOPIC_PREFIX").ok().filter(|p| !p.is_empty());
        let with_prefix = |topic: &str| match &prefix {
            Some(p) => format!("{p}/{topic}"),
            None => topic.to_string(),
        };

        Self {
            enabled: env_bool("MQTT_ENABLED", false),
            broker_url: env_string("MQTT_BROKER_URL", DEFAULT_BROKER_URL),
            client_id: std::env::var("MQTT_CLIENT_ID").unwrap_or_else(|_| default_client_id()),
            username: std::env::var("MQTT_USERNAME").ok(),
            password: std::env::var("MQTT_PASSWORD").ok(),

            command_topic: with_prefix(&env_string("MQTT_COMMAND_TOPIC", DEFAULT_COMMAND_TOPIC)),
            response_topic: with_prefix(&env_string("MQTT_RESPONSE_TOPIC", DEFAULT_RESPONSE_TOPIC)),
            approval_request_topic: with_prefix(&env_string(
                "MQTT_APPROVAL_REQUEST_TOPIC",
                DEFAULT_APPROVAL_REQUEST_TOPIC,
            )),
            approval_response_topic: with_prefix(&env_string(
                "MQTT_APPROVAL_RESPONSE_TOPIC",
                DEFAULT_APPROVAL_RESPONSE_TOPIC,
            )),
            status_topic: with_prefix(STATUS_TOPIC),

            approval_timeout_ms: env_u64("MQTT_APPROVAL_TIMEOUT", DEFAULT_APPROVAL_TIMEOUT_MS),
            reconnect_backoff_ms: env_u64("MQTT_RECONNECT_BACKOFF", DEFAULT_RECONNECT_BACKOFF_MS),

            agent_workspace_root: std::env::var("AGENT_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
            claude_cli_path: env_string("CLAUDE_CLI_PATH", DEFAULT_CLAUDE_CLI_PATH),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
}

fn default_client_id() -> String {
    let epoch_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    format!("claudecodeui-{epoch_ms}")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
