//! The Broker Client Adapter: a `rumqttc::AsyncClient` plus a background
//! task polling its `EventLoop`, following the reconnect/resubscribe loop
//! common to MQTT client wrappers — match `ConnAck` to (re)subscribe and
//! publish retained liveness, match `Err` to log and back off before the
//! next poll. `rumqttc` drives the actual reconnect; this loop only reacts
//! to the connection-state transitions it reports.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bridge_core::BridgeConfig;
use bridge_wire::Liveness;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::BrokerError;
use crate::publisher::Publisher;
use crate::url::parse_broker_url;

const KEEPALIVE_SECS: u64 = 30;
const OPERATION_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_QUEUE_CAPACITY: usize = 64;

/// A message delivered on one of the topics the client subscribed to.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// A cheaply-cloneable publish handle backed by the live client.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), BrokerError> {
        tokio::time::timeout(
            OPERATION_TIMEOUT,
            self.client.publish(topic, QoS::AtMostOnce, retain, payload),
        )
        .await
        .map_err(|_| BrokerError::PublishTimeout { topic: topic.to_string() })??;
        Ok(())
    }
}

/// Owns the background event loop task. Carries enough of the
/// configuration to publish the offline liveness message on shutdown.
pub struct BrokerClient {
    publisher: MqttPublisher,
    event_loop_task: JoinHandle<()>,
    status_topic: String,
    client_id: String,
}

impl BrokerClient {
    /// Opens a session to `config.broker_url` and spawns the event loop
    /// task. Returns the client and the channel of inbound messages on
    /// the subscribed topics (command-in, approval-response-in).
    pub async fn connect(
        config: &BridgeConfig,
    ) -> Result<(Self, mpsc::Receiver<InboundMessage>), BrokerError> {
        let address = parse_broker_url(&config.broker_url)?;
        let mut opts = MqttOptions::new(config.client_id.clone(), address.host.clone(), address.port);
        opts.set_keep_alive(Duration::from_secs(KEEPALIVE_SECS));
        if let Some(username) = &config.username {
            opts.set_credentials(username.clone(), config.password.clone().unwrap_or_default());
        }
        if address.tls {
            let mut roots = rustls::RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            opts.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(Arc::new(
                tls_config,
            ))));
        }

        let (client, mut event_loop) = AsyncClient::new(opts, EVENT_QUEUE_CAPACITY);
        let publisher = MqttPublisher { client: client.clone() };

        let (inbound_tx, inbound_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        let command_topic = config.command_topic.clone();
        let approval_response_topic = config.approval_response_topic.clone();
        let status_topic = config.status_topic.clone();
        let client_id = config.client_id.clone();
        let reconnect_backoff = Duration::from_millis(config.reconnect_backoff_ms);
        let subscribe_client = client.clone();

        let event_loop_task = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt connected, resubscribing");
                        for topic in [command_topic.as_str(), approval_response_topic.as_str()] {
                            if let Err(e) = subscribe_client.subscribe(topic, QoS::AtMostOnce).await {
                                warn!(topic, error = %e, "subscribe failed, will retry on next reconnect");
                            }
                        }
                        if let Err(e) =
                            publish_liveness(&subscribe_client, &status_topic, &client_id, true).await
                        {
                            warn!(error = %e, "failed to publish retained liveness");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let message = InboundMessage {
                            topic: publish.topic.clone(),
                            payload: publish.payload.to_vec(),
                        };
                        if inbound_tx.send(message).await.is_err() {
                            debug!("inbound channel closed, stopping event loop");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(
                            error = %e,
                            backoff_ms = reconnect_backoff.as_millis() as u64,
                            "mqtt connection error"
                        );
                        tokio::time::sleep(reconnect_backoff).await;
                    }
                }
            }
        });

        Ok((
            Self {
                publisher,
                event_loop_task,
                status_topic: config.status_topic.clone(),
                client_id: config.client_id.clone(),
            },
            inbound_rx,
        ))
    }

    /// A cloneable handle usable anywhere a [`Publisher`] is needed.
    pub fn publisher(&self) -> MqttPublisher {
        self.publisher.clone()
    }

    /// Publishes retained `{online:false}`, disconnects, and stops the
    /// event loop task. Best-effort: failures are logged, never returned,
    /// since the process is tearing down regardless.
    pub async fn shutdown(self) {
        if let Err(e) =
            publish_liveness(&self.publisher.client, &self.status_topic, &self.client_id, false).await
        {
            warn!(error = %e, "failed to publish offline liveness during shutdown");
        }
        let _ = tokio::time::timeout(OPERATION_TIMEOUT, self.publisher.client.disconnect()).await;
        self.event_loop_task.abort();
    }
}

impl Drop for BrokerClient {
    fn drop(&mut self) {
        self.event_loop_task.abort();
    }
}

async fn publish_liveness(
    client: &AsyncClient,
    topic: &str,
    server_id: &str,
    online: bool,
) -> Result<(), BrokerError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0);
    let liveness = if online {
        Liveness::online(server_id, now)
    } else {
        Liveness::offline(server_id, now)
    };
    let payload = serde_json::to_vec(&liveness)?;
    tokio::time::timeout(OPERATION_TIMEOUT, client.publish(topic, QoS::AtMostOnce, true, payload))
        .await
        .map_err(|_| BrokerError::PublishTimeout { topic: topic.to_string() })??;
    Ok(())
}
