// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport.
//!
//! The transport owns one broker connection shared by every device. It
//! subscribes to each device's filter and forwards received publishes
//! through the [`TopicRouter`]. It never publishes.
//!
//! # Examples
//!
//! ```no_run
//! use homesync_lib::protocol::{MqttTransport, MqttTransportConfig};
//!
//! # async fn example() -> homesync_lib::Result<()> {
//! let config = MqttTransportConfig::new("mqtt.example.com").with_credentials("user", "password");
//! let transport = MqttTransport::connect(config).await?;
//!
//! let mut inbox = transport.subscribe("servicelocation/1234/#").await?;
//! while let Some(message) = inbox.recv().await {
//!     println!("{}", message.topic);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::oneshot;

use crate::error::ProtocolError;

use super::topic_router::{Inbox, TopicRouter};

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Keep-alive interval of the broker connection.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Configuration for the MQTT transport.
///
/// # Examples
///
/// ```
/// use homesync_lib::protocol::MqttTransportConfig;
///
/// let config = MqttTransportConfig::new("mqtt.example.com").with_port(8883);
/// assert_eq!(config.host(), "mqtt.example.com");
/// assert_eq!(config.port(), 8883);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttTransportConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    connection_timeout: Duration,
    inbox_capacity: usize,
}

impl MqttTransportConfig {
    /// Default broker port.
    pub const DEFAULT_PORT: u16 = 1883;

    /// Default time to wait for the broker to accept the connection.
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default capacity of each device inbox.
    pub const DEFAULT_INBOX_CAPACITY: usize = 32;

    /// Creates a configuration for the given broker host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            credentials: None,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
            inbox_capacity: Self::DEFAULT_INBOX_CAPACITY,
        }
    }

    /// Sets the broker port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username and password sent on connect.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets how long [`MqttTransport::connect`] waits for the ConnAck.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the capacity of each device inbox.
    #[must_use]
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity;
        self
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

/// A broker connection shared by every device.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct MqttTransport {
    inner: Arc<MqttTransportInner>,
}

struct MqttTransportInner {
    client: AsyncClient,
    router: TopicRouter,
    config: MqttTransportConfig,
    connected: AtomicBool,
}

impl MqttTransport {
    /// Connects to the broker and waits for it to accept the connection.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty, the connection fails or it times
    /// out.
    pub async fn connect(config: MqttTransportConfig) -> Result<Self, ProtocolError> {
        if config.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("homesync_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, &config.host, config.port);
        mqtt_options.set_keep_alive(KEEP_ALIVE);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        let timeout = config.connection_timeout;

        let transport = Self {
            inner: Arc::new(MqttTransportInner {
                client,
                router: TopicRouter::new(),
                config,
                connected: AtomicBool::new(false),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();
        tokio::spawn(handle_transport_events(
            event_loop,
            transport.clone(),
            connack_tx,
        ));

        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %transport.host(),
                    port = %transport.port(),
                    client_id = %client_id,
                    "Connected to MQTT broker"
                );
                Ok(transport)
            }
            Ok(Err(_)) => Err(ProtocolError::ConnectionFailed(
                "MQTT event loop terminated unexpectedly".to_string(),
            )),
            Err(_) => Err(ProtocolError::ConnectionFailed(format!(
                "no ConnAck from {}:{} within {}ms",
                transport.host(),
                transport.port(),
                timeout.as_millis()
            ))),
        }
    }

    /// Returns whether the broker connection is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the router dispatching received messages.
    #[must_use]
    pub fn router(&self) -> &TopicRouter {
        &self.inner.router
    }

    /// Subscribes to a topic filter and returns the inbox receiving its
    /// messages.
    ///
    /// The broker subscription is shared by every inbox of the same filter
    /// and only requested for the first one.
    ///
    /// # Errors
    ///
    /// Returns error if the MQTT subscription request fails.
    pub async fn subscribe(&self, filter: impl Into<String>) -> Result<Inbox, ProtocolError> {
        let filter = filter.into();

        // Register first so nothing published right after the SUBACK is lost
        let inbox = self
            .inner
            .router
            .register(filter.clone(), self.inner.config.inbox_capacity);

        if self.inner.router.route_count(&filter) > 1 {
            tracing::debug!(filter = %filter, "Sharing existing subscription");
            return Ok(inbox);
        }

        if let Err(e) = self
            .inner
            .client
            .subscribe(&filter, QoS::AtLeastOnce)
            .await
        {
            self.inner.router.unregister(inbox.id());
            return Err(ProtocolError::Mqtt(e));
        }

        tracing::debug!(filter = %filter, "Subscribed to device topics");
        Ok(inbox)
    }

    /// Closes an inbox returned by [`subscribe`](Self::subscribe).
    ///
    /// The broker subscription is dropped once no inbox of the filter is
    /// left.
    ///
    /// # Errors
    ///
    /// Returns error if the MQTT unsubscribe request fails.
    pub async fn unsubscribe(&self, inbox: &Inbox) -> Result<(), ProtocolError> {
        let filter = inbox.filter();
        self.inner.router.unregister(inbox.id());

        if self.inner.router.route_count(filter) > 0 {
            tracing::debug!(filter = %filter, "Filter still in use, keeping subscription");
            return Ok(());
        }

        self.inner
            .client
            .unsubscribe(filter)
            .await
            .map_err(ProtocolError::Mqtt)?;

        tracing::debug!(filter = %filter, "Unsubscribed from device topics");
        Ok(())
    }

    /// Disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request fails.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        self.inner.router.clear();

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Drives the MQTT event loop and forwards publishes to the router.
async fn handle_transport_events(
    mut event_loop: EventLoop,
    transport: MqttTransport,
    connack_tx: oneshot::Sender<()>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                transport.inner.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::trace!(topic = %publish.topic, bytes = publish.payload.len(), "MQTT message received");
                transport.inner.router.route(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                transport.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT transport event loop error");
                transport.inner.connected.store(false, Ordering::Release);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = MqttTransportConfig::new("broker.local");
        assert_eq!(config.host(), "broker.local");
        assert_eq!(config.port(), 1883);
        assert!(config.credentials.is_none());
        assert_eq!(config.connection_timeout, Duration::from_secs(10));
        assert_eq!(config.inbox_capacity, 32);
    }

    #[test]
    fn config_overrides() {
        let config = MqttTransportConfig::new("broker.local")
            .with_port(8883)
            .with_credentials("admin", "secret")
            .with_connection_timeout(Duration::from_secs(2))
            .with_inbox_capacity(8);

        assert_eq!(config.port(), 8883);
        assert_eq!(
            config.credentials,
            Some(("admin".to_string(), "secret".to_string()))
        );
        assert_eq!(config.connection_timeout, Duration::from_secs(2));
        assert_eq!(config.inbox_capacity, 8);
    }

    #[tokio::test]
    async fn blank_host_fails() {
        let result = MqttTransport::connect(MqttTransportConfig::new("  ")).await;
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }
}
