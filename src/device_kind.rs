// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device kinds.
//!
//! Both kinds share the reconciliation algorithm; a kind only selects
//! which topic to subscribe to, which payload fields are recognized and
//! which capability gates each field.

use serde::{Deserialize, Serialize};

use crate::capabilities::Capability;
use crate::payload::SyncField;
use crate::protocol::TopicKind;

/// Subscription topic of a device, relative to its topic base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTopic {
    /// A single fixed sub-topic.
    Fixed(&'static str),
    /// Every sub-topic of the device.
    Wildcard,
}

impl SubscriptionTopic {
    /// Returns the full MQTT filter under the given base.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::SubscriptionTopic;
    ///
    /// assert_eq!(SubscriptionTopic::Fixed("power").filter("servicelocation/1"), "servicelocation/1/power");
    /// assert_eq!(SubscriptionTopic::Wildcard.filter("servicelocation/1"), "servicelocation/1/#");
    /// ```
    #[must_use]
    pub fn filter(self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Self::Fixed(suffix) => format!("{base}/{suffix}"),
            Self::Wildcard => format!("{base}/#"),
        }
    }
}

/// Kind of synchronized device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Energy meter publishing power telemetry only.
    EnergyMeter,
    /// EV wall charger connector with power, charging and LED signals.
    EvWall,
}

impl DeviceKind {
    /// Returns the topic the device subscribes to.
    #[must_use]
    pub const fn subscription_topic(self) -> SubscriptionTopic {
        match self {
            Self::EnergyMeter => SubscriptionTopic::Fixed("power"),
            Self::EvWall => SubscriptionTopic::Wildcard,
        }
    }

    /// Returns `true` if messages of this topic kind concern the device.
    #[must_use]
    pub const fn handles(self, topic: TopicKind) -> bool {
        match (self, topic) {
            (_, TopicKind::Unrecognized) => false,
            (Self::EnergyMeter, topic) => matches!(topic, TopicKind::TelemetryPower),
            (Self::EvWall, _) => true,
        }
    }

    /// Returns `true` if the device reconciles this payload field.
    #[must_use]
    pub const fn recognizes(self, field: SyncField) -> bool {
        match self {
            Self::EnergyMeter => matches!(
                field,
                SyncField::ConsumptionPower | SyncField::AlwaysOnPower
            ),
            Self::EvWall => true,
        }
    }

    /// Returns `true` if the device has a status LED that can be queried.
    #[must_use]
    pub const fn supports_led(self) -> bool {
        self.recognizes(SyncField::LedBrightness)
    }

    /// Returns the capability a field is written to, if any.
    ///
    /// Fields without a capability (LED brightness, availability) are
    /// written to settings or device availability instead.
    #[must_use]
    pub const fn capability_gate(field: SyncField) -> Option<Capability> {
        match field {
            SyncField::ConsumptionPower => Some(Capability::MeasurePower),
            SyncField::AlwaysOnPower => Some(Capability::MeasurePowerAlwaysOn),
            SyncField::ChargingState => Some(Capability::CableConnected),
            SyncField::ChargingMode => Some(Capability::ChargingMode),
            SyncField::LedBrightness | SyncField::Available => None,
        }
    }
}
