// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic classification and routing.
//!
//! A single MQTT connection carries traffic for every device. The
//! [`TopicRouter`] delivers each message to the inbox of every device whose
//! subscription filter matches the topic; the device then classifies the
//! topic with [`TopicKind::classify`].
//!
//! # Architecture
//!
//! ```text
//! MQTT Message: servicelocation/1234/chargingstate → {"chargingState":"STOPPED"}
//!                     ↓
//!             TopicRouter.route()
//!                     ↓
//!     Match "servicelocation/1234/#" in registered filters
//!                     ↓
//!           inbox.try_send(InboundMessage)
//!                     ↓
//!     SyncDevice::run() → TopicKind::TelemetryChargingState
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;

/// Class of an inbound topic, decided by its last path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Power telemetry (`.../power`).
    TelemetryPower,
    /// Charging state telemetry (`.../chargingstate`).
    TelemetryChargingState,
    /// Configuration lifecycle update (`.../updated`).
    LifecycleUpdated,
    /// Traffic outside the interest set, dropped silently.
    Unrecognized,
}

impl TopicKind {
    /// Classifies a topic by suffix.
    ///
    /// The suffixes are mutually exclusive, so the order of the checks does
    /// not matter.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::protocol::TopicKind;
    ///
    /// assert_eq!(TopicKind::classify("servicelocation/1/power"), TopicKind::TelemetryPower);
    /// assert_eq!(TopicKind::classify("servicelocation/1/realtime"), TopicKind::Unrecognized);
    /// ```
    #[must_use]
    pub fn classify(topic: &str) -> Self {
        if topic.ends_with("chargingstate") {
            Self::TelemetryChargingState
        } else if topic.ends_with("power") {
            Self::TelemetryPower
        } else if topic.ends_with("updated") {
            Self::LifecycleUpdated
        } else {
            Self::Unrecognized
        }
    }
}

/// A message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Full MQTT topic.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl InboundMessage {
    /// Creates a new inbound message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Identifies one registration in a [`TopicRouter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

/// The receiving end of a device registration.
///
/// Several devices may register the same filter (two connectors of one
/// station share their location topics), so each inbox carries its own
/// [`RouteId`].
#[derive(Debug)]
pub struct Inbox {
    id: RouteId,
    filter: String,
    receiver: mpsc::Receiver<InboundMessage>,
}

impl Inbox {
    /// Returns the id of the registration.
    #[must_use]
    pub fn id(&self) -> RouteId {
        self.id
    }

    /// Returns the subscription filter the inbox was registered with.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Receives the next message, or `None` once the route is gone.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }

    /// Receives a message without waiting.
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` if no message is queued and
    /// `TryRecvError::Disconnected` once the route is gone.
    pub fn try_recv(&mut self) -> Result<InboundMessage, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

#[derive(Debug)]
struct Route {
    id: RouteId,
    sender: mpsc::Sender<InboundMessage>,
}

/// Routes MQTT messages to per-device inboxes.
///
/// Each registration owns the sending half of a bounded channel. A filter
/// may hold any number of registrations. When a device drops its inbox,
/// the route is skipped while routing and removed on the next
/// [`cleanup`](Self::cleanup).
#[derive(Debug, Default)]
pub struct TopicRouter {
    /// Map from subscription filter to the inboxes registered for it.
    routes: RwLock<HashMap<String, Vec<Route>>>,
    next_id: AtomicU64,
}

impl TopicRouter {
    /// Creates a new empty topic router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription filter and returns the device inbox.
    ///
    /// Registrations of the same filter coexist; each receives its own
    /// copy of every matching message.
    pub fn register(&self, filter: impl Into<String>, capacity: usize) -> Inbox {
        let filter = filter.into();
        let id = RouteId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        tracing::debug!(filter = %filter, route = id.0, "Registering device for routing");
        self.routes
            .write()
            .entry(filter.clone())
            .or_default()
            .push(Route { id, sender });

        Inbox {
            id,
            filter,
            receiver,
        }
    }

    /// Unregisters one registration and closes its inbox.
    ///
    /// Returns `true` if the registration existed.
    pub fn unregister(&self, id: RouteId) -> bool {
        let mut routes = self.routes.write();
        let mut removed = false;

        routes.retain(|filter, entries| {
            let before = entries.len();
            entries.retain(|route| route.id != id);
            if entries.len() != before {
                removed = true;
                tracing::debug!(filter = %filter, route = id.0, "Unregistering device from routing");
            }
            !entries.is_empty()
        });
        removed
    }

    /// Unregisters every registration of a filter.
    ///
    /// Returns the number of registrations removed.
    pub fn unregister_filter(&self, filter: &str) -> usize {
        tracing::debug!(filter = %filter, "Unregistering filter from routing");
        self.routes
            .write()
            .remove(filter)
            .map_or(0, |entries| entries.len())
    }

    /// Removes every registration.
    pub fn clear(&self) {
        self.routes.write().clear();
    }

    /// Routes a message to every device whose filter matches the topic.
    ///
    /// Returns the number of inboxes the message was delivered to. A full
    /// inbox drops the message; the next message re-converges the state.
    pub fn route(&self, topic: &str, payload: &[u8]) -> usize {
        let routes = self.routes.read();
        let mut delivered = 0;

        for (filter, entries) in routes.iter() {
            if !topic_matches(filter, topic) {
                continue;
            }

            for route in entries.iter().filter(|route| !route.sender.is_closed()) {
                match route.sender.try_send(InboundMessage::new(topic, payload)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(filter = %filter, route = route.id.0, topic = %topic, "Device inbox full, dropping message");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {}
                }
            }
        }

        if delivered == 0 {
            tracing::trace!(topic = %topic, "No registered device for topic");
        }
        delivered
    }

    /// Removes routes whose inbox has been dropped.
    pub fn cleanup(&self) {
        self.routes.write().retain(|filter, entries| {
            entries.retain(|route| {
                let alive = !route.sender.is_closed();
                if !alive {
                    tracing::debug!(filter = %filter, route = route.id.0, "Cleaning up dropped device");
                }
                alive
            });
            !entries.is_empty()
        });
    }

    /// Returns the registered filters.
    #[must_use]
    pub fn filters(&self) -> Vec<String> {
        self.routes.read().keys().cloned().collect()
    }

    /// Returns the number of registrations of a filter.
    #[must_use]
    pub fn route_count(&self, filter: &str) -> usize {
        self.routes.read().get(filter).map_or(0, Vec::len)
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.routes.read().values().map(Vec::len).sum()
    }

    /// Returns the number of devices whose inbox is still open.
    #[must_use]
    pub fn active_device_count(&self) -> usize {
        self.routes
            .read()
            .values()
            .flatten()
            .filter(|route| !route.sender.is_closed())
            .count()
    }
}

/// Returns `true` if an MQTT topic matches a subscription filter.
///
/// Supports the `+` (single level) and `#` (remaining levels, including
/// the parent level itself) wildcards.
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_suffix() {
        assert_eq!(
            TopicKind::classify("servicelocation/1/power"),
            TopicKind::TelemetryPower
        );
        assert_eq!(
            TopicKind::classify("servicelocation/1/etc/carcharger/acchargingcontroller/v1/devices/SN/chargingstate"),
            TopicKind::TelemetryChargingState
        );
        assert_eq!(
            TopicKind::classify("servicelocation/1/etc/smart/device/SN/updated"),
            TopicKind::LifecycleUpdated
        );
        assert_eq!(
            TopicKind::classify("servicelocation/1/presence"),
            TopicKind::Unrecognized
        );
        assert_eq!(TopicKind::classify(""), TopicKind::Unrecognized);
    }

    #[test]
    fn topic_matching() {
        assert!(topic_matches("a/b/power", "a/b/power"));
        assert!(!topic_matches("a/b/power", "a/b/power/x"));
        assert!(!topic_matches("a/b/power", "a/b"));
        assert!(topic_matches("a/b/#", "a/b/c/d"));
        assert!(topic_matches("a/b/#", "a/b"));
        assert!(!topic_matches("a/b/#", "a/c/d"));
        assert!(topic_matches("a/+/power", "a/b/power"));
        assert!(!topic_matches("a/+/power", "a/b/c/power"));
        assert!(topic_matches("#", "anything/at/all"));
    }

    #[test]
    fn router_register_and_route() {
        let router = TopicRouter::new();
        let mut inbox = router.register("servicelocation/1/#", 4);
        assert_eq!(router.device_count(), 1);

        let delivered = router.route("servicelocation/1/power", br#"{"consumptionPower":1}"#);
        assert_eq!(delivered, 1);

        let message = inbox.try_recv().unwrap();
        assert_eq!(message.topic, "servicelocation/1/power");
        assert_eq!(message.payload, br#"{"consumptionPower":1}"#);
    }

    #[test]
    fn router_unmatched_topic() {
        let router = TopicRouter::new();
        let mut inbox = router.register("servicelocation/1/power", 4);

        assert_eq!(router.route("servicelocation/2/power", b"{}"), 0);
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn router_delivers_to_every_matching_device() {
        let router = TopicRouter::new();
        let mut meter = router.register("servicelocation/1/power", 4);
        let mut wall = router.register("servicelocation/1/#", 4);

        assert_eq!(router.route("servicelocation/1/power", b"{}"), 2);
        assert_eq!(router.route("servicelocation/1/updated", b"{}"), 1);

        assert_eq!(meter.try_recv().unwrap().topic, "servicelocation/1/power");
        assert!(meter.try_recv().is_err());
        assert_eq!(wall.try_recv().unwrap().topic, "servicelocation/1/power");
        assert_eq!(wall.try_recv().unwrap().topic, "servicelocation/1/updated");
    }

    #[test]
    fn router_unregister() {
        let router = TopicRouter::new();
        let mut inbox = router.register("servicelocation/1/power", 4);

        assert!(router.unregister(inbox.id()));
        assert!(!router.unregister(inbox.id()));
        assert_eq!(router.route("servicelocation/1/power", b"{}"), 0);
        assert!(router.filters().is_empty());
        assert_eq!(
            inbox.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
    }

    #[test]
    fn router_unregister_filter() {
        let router = TopicRouter::new();
        let _first = router.register("a/#", 4);
        let _second = router.register("a/#", 4);
        let _other = router.register("b/#", 4);

        assert_eq!(router.unregister_filter("a/#"), 2);
        assert_eq!(router.unregister_filter("a/#"), 0);
        assert_eq!(router.device_count(), 1);

        router.clear();
        assert_eq!(router.device_count(), 0);
    }

    #[test]
    fn router_cleanup_dropped_device() {
        let router = TopicRouter::new();
        {
            let _inbox = router.register("temporary/#", 4);
            assert_eq!(router.active_device_count(), 1);
        }

        assert_eq!(router.device_count(), 1);
        assert_eq!(router.active_device_count(), 0);
        assert_eq!(router.route("temporary/power", b"{}"), 0);

        router.cleanup();
        assert_eq!(router.device_count(), 0);
    }

    #[test]
    fn router_full_inbox_drops_message() {
        let router = TopicRouter::new();
        let mut inbox = router.register("a/#", 1);

        assert_eq!(router.route("a/power", b"1"), 1);
        assert_eq!(router.route("a/power", b"2"), 0);

        assert_eq!(inbox.try_recv().unwrap().payload, b"1");
        assert!(inbox.try_recv().is_err());
    }

    #[test]
    fn connectors_sharing_a_filter_each_get_messages() {
        let router = TopicRouter::new();
        let mut first = router.register("servicelocation/1234/#", 4);
        let mut second = router.register("servicelocation/1234/#", 4);
        assert_ne!(first.id(), second.id());
        assert_eq!(router.route_count("servicelocation/1234/#"), 2);
        assert_eq!(router.filters(), vec!["servicelocation/1234/#".to_string()]);

        assert_eq!(router.route("servicelocation/1234/chargingstate", b"{}"), 2);
        assert_eq!(first.try_recv().unwrap().topic, "servicelocation/1234/chargingstate");
        assert_eq!(second.try_recv().unwrap().topic, "servicelocation/1234/chargingstate");

        // Removing one connector leaves the other routed
        assert!(router.unregister(first.id()));
        assert_eq!(router.route_count("servicelocation/1234/#"), 1);
        assert_eq!(router.route("servicelocation/1234/power", b"{}"), 1);
        assert_eq!(second.try_recv().unwrap().topic, "servicelocation/1234/power");
        assert_eq!(
            first.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
    }

    #[test]
    fn cleanup_keeps_live_registrations_of_shared_filter() {
        let router = TopicRouter::new();
        let live = router.register("a/#", 4);
        drop(router.register("a/#", 4));

        router.cleanup();

        assert_eq!(router.route_count("a/#"), 1);
        assert_eq!(live.filter(), "a/#");
    }
}
