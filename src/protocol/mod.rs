// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push transport: topic classification, routing and the MQTT connection.
//!
//! - [`TopicKind`]: classifies an inbound topic by its last segment
//! - [`TopicRouter`]: delivers messages to the devices whose filter matches
//! - [`MqttTransport`]: shared broker connection feeding the router

#[cfg(feature = "mqtt")]
mod mqtt_transport;
mod topic_router;

#[cfg(feature = "mqtt")]
pub use mqtt_transport::{MqttTransport, MqttTransportConfig};
pub use topic_router::{InboundMessage, Inbox, RouteId, TopicKind, TopicRouter, topic_matches};
