//! Bridge Lifecycle: builds every collaborator from a [`BridgeConfig`],
//! drives the receive loop, and tears everything down on shutdown.

use std::sync::Arc;

use bridge_broker::{BrokerClient, Publisher};
use bridge_core::BridgeConfig;
use bridge_engine::{ApprovalRegistry, ClaudeCodeAgent, CommandHandler, RealCredentialProbe};
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::error::LifecycleError;

/// Runs the bridge to completion: connect, dispatch until shutdown,
/// teardown. Returns immediately, doing nothing, when `config.enabled` is
/// false.
pub async fn run(config: BridgeConfig) -> Result<(), LifecycleError> {
    if !config.enabled {
        info!("MQTT bridge disabled (MQTT_ENABLED is not true), doing nothing");
        return Ok(());
    }

    let (broker_client, mut inbound) = BrokerClient::connect(&config).await?;
    let publisher: Arc<dyn Publisher> = Arc::new(broker_client.publisher());
    let registry = Arc::new(ApprovalRegistry::new());
    let agent = Arc::new(ClaudeCodeAgent::new(config.claude_cli_path.clone()));
    let command_handler = Arc::new(CommandHandler::new(
        &config,
        registry.clone(),
        publisher.clone(),
        agent,
        Arc::new(RealCredentialProbe),
    ));
    let dispatcher = Dispatcher::new(&config, registry.clone(), command_handler);

    info!(broker_url = %config.broker_url, client_id = %config.client_id, "MQTT bridge started");

    loop {
        tokio::select! {
            message = inbound.recv() => {
                match message {
                    Some(message) => dispatcher.dispatch(&message.topic, &message.payload).await,
                    None => {
                        info!("broker event loop ended, shutting down");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                break;
            }
        }
    }

    shutdown(registry, broker_client).await;
    Ok(())
}

/// Cancels every pending approval, publishes retained `{online:false}`,
/// and closes the broker client. Order matters: approvals are cancelled
/// before the client stops accepting new publishes.
async fn shutdown(registry: Arc<ApprovalRegistry>, broker_client: BrokerClient) {
    registry.cancel_all("MQTT bridge shutdown").await;
    broker_client.shutdown().await;
    info!("MQTT bridge shut down");
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
