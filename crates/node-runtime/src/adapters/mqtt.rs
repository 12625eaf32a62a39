//! # MQTT Transport Adapter
//!
//! Implements [`TokenPublisher`] over an MQTT broker with `rumqttc`.
//!
//! ## Connection Lifecycle
//!
//! 1. `connect()` drives the event loop until CONNACK (or fails fast)
//! 2. `subscribe()` queues a QoS 0 subscription on the node topic
//! 3. `spawn_inbox()` moves the event loop into a task that forwards every
//!    PUBLISH on the node topic into an mpsc inbox
//! 4. After a reconnect the session is clean, so every later CONNACK
//!    re-queues the node subscription
//!
//! The `AsyncClient` handle is cloneable and only enqueues requests, so
//! delivery tasks can publish while the event loop task is polling.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use relay_engine::{NodeIdentity, Topic, TokenPublisher, TransportError};

use crate::container::config::BrokerConfig;

/// Pause between event loop errors while rumqttc reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Publishing handle for one node's broker connection.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
    endpoint: String,
}

/// Event loop half of the connection, consumed by [`MqttConnection::spawn_inbox`].
pub struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
}

/// What the inbox task does with one event loop event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InboxAction {
    /// Payload published on the node topic.
    Deliver(Vec<u8>),
    /// Broker accepted a reconnect; the subscription is gone.
    Resubscribe,
    /// We sent DISCONNECT.
    Stop,
    Ignore,
}

/// Map an event on the node's connection to an inbox action.
///
/// The first CONNACK is consumed by [`MqttTransport::connect`], so any
/// CONNACK seen here follows a reconnect.
pub(crate) fn classify(event: &Event, topic: &Topic) -> InboxAction {
    match event {
        Event::Incoming(Packet::Publish(publish)) if publish.topic == topic.as_str() => {
            InboxAction::Deliver(publish.payload.to_vec())
        }
        Event::Incoming(Packet::Publish(publish)) => {
            debug!(topic = %publish.topic, "Ignoring message on foreign topic");
            InboxAction::Ignore
        }
        Event::Incoming(Packet::ConnAck(_)) => InboxAction::Resubscribe,
        Event::Outgoing(Outgoing::Disconnect) => InboxAction::Stop,
        _ => InboxAction::Ignore,
    }
}

impl MqttTransport {
    /// Connect to the broker as `<prefix>-<node>` and wait for CONNACK.
    pub async fn connect(
        broker: &BrokerConfig,
        node: NodeIdentity,
    ) -> Result<(Self, MqttConnection), TransportError> {
        let endpoint = broker.endpoint();
        let client_id = broker.client_id(node);

        let mut options = MqttOptions::new(client_id.clone(), broker.host.clone(), broker.port);
        options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, broker.request_capacity);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    debug!(code = ?ack.code, "CONNACK received");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(TransportError::Connect {
                        endpoint,
                        reason: e.to_string(),
                    })
                }
            }
        }

        info!(endpoint = %endpoint, client_id = %client_id, "Connected to MQTT broker");
        let connection = MqttConnection {
            client: client.clone(),
            eventloop,
        };
        Ok((Self { client, endpoint }, connection))
    }

    /// Subscribe to `topic` with QoS 0.
    pub async fn subscribe(&self, topic: &Topic) -> Result<(), TransportError> {
        self.client
            .subscribe(topic.as_str(), QoS::AtMostOnce)
            .await
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    /// Send DISCONNECT; the inbox task exits once it is flushed.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            warn!(endpoint = %self.endpoint, error = %e, "Failed to disconnect cleanly");
        }
    }
}

#[async_trait]
impl TokenPublisher for MqttTransport {
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic.as_str(), QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| TransportError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}

impl MqttConnection {
    /// Poll the connection in a background task, forwarding payloads that
    /// arrive on `topic` into the returned inbox.
    pub fn spawn_inbox(
        self,
        topic: Topic,
        capacity: usize,
    ) -> (mpsc::Receiver<Vec<u8>>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let MqttConnection {
            client,
            mut eventloop,
        } = self;

        let handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(event) => match classify(&event, &topic) {
                        InboxAction::Deliver(payload) => {
                            if tx.send(payload).await.is_err() {
                                debug!("Inbox closed, stopping MQTT event loop");
                                break;
                            }
                        }
                        InboxAction::Resubscribe => {
                            match client.try_subscribe(topic.as_str(), QoS::AtMostOnce) {
                                Ok(()) => info!(topic = %topic, "Reconnected, resubscribing"),
                                Err(e) => warn!(topic = %topic, error = %e, "Resubscribe failed"),
                            }
                        }
                        InboxAction::Stop => {
                            info!("MQTT connection closed");
                            break;
                        }
                        InboxAction::Ignore => {}
                    },
                    Err(e) => {
                        warn!(error = %e, "MQTT connection error, retrying");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        (rx, handle)
    }
}
