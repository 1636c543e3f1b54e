// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload normalization.
//!
//! Three sources feed device state, each with its own payload shape:
//!
//! - telemetry (`power`, `chargingstate` topics) already uses the
//!   canonical [`SyncPayload`] shape and is passed through,
//! - lifecycle updates (`updated` topic) carry an [`UpdateMessage`] from
//!   which the LED brightness is extracted,
//! - the remote LED brightness query returns a bare number.
//!
//! All of them end up as a [`SyncPayload`]. Normalization never fails:
//! undecodable input is logged and produces an empty payload.

mod sync_payload;
mod update_message;

pub use sync_payload::{SyncField, SyncPayload};
pub use update_message::{PropertyValue, UpdateMessage};
pub(crate) use update_message::numeric_value;

use crate::protocol::TopicKind;
use crate::types::Brightness;

/// Normalizes a raw transport payload of the given topic kind.
///
/// # Examples
///
/// ```
/// use homesync_lib::payload::normalize;
/// use homesync_lib::protocol::TopicKind;
///
/// let payload = normalize(TopicKind::TelemetryChargingState, br#"{"chargingState":"STOPPED"}"#);
/// assert!(payload.charging_state.is_some());
///
/// // Garbage never fails, it just carries no information
/// assert!(normalize(TopicKind::TelemetryPower, b"garbage").is_blank());
/// ```
#[must_use]
pub fn normalize(kind: TopicKind, bytes: &[u8]) -> SyncPayload {
    let result = match kind {
        TopicKind::TelemetryPower | TopicKind::TelemetryChargingState => {
            SyncPayload::from_json(bytes)
        }
        TopicKind::LifecycleUpdated => {
            UpdateMessage::from_json(bytes).map(|message| message.to_sync_payload())
        }
        TopicKind::Unrecognized => return SyncPayload::new(),
    };

    result.unwrap_or_else(|e| {
        tracing::debug!(kind = ?kind, error = %e, "Ignoring undecodable payload");
        SyncPayload::new()
    })
}

/// Wraps the result of a remote LED brightness query.
///
/// Devices without an LED id cannot be queried, so they always produce an
/// empty payload.
#[must_use]
pub fn normalize_led_query(led_id: Option<&str>, brightness: f64) -> SyncPayload {
    match led_id {
        Some(id) if !id.trim().is_empty() => {
            SyncPayload::new().with_led_brightness(Brightness::from_number(brightness))
        }
        _ => SyncPayload::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_is_passed_through() {
        let payload = normalize(
            TopicKind::TelemetryPower,
            br#"{"consumptionPower": 230, "alwaysOnPower": 4}"#,
        );
        assert_eq!(
            payload,
            SyncPayload::new()
                .with_consumption_power(230.0)
                .with_always_on_power(4.0)
        );
    }

    #[test]
    fn telemetry_keeps_fields_next_to_a_bad_one() {
        let payload = normalize(
            TopicKind::TelemetryPower,
            br#"{"consumptionPower": 100, "available": "true"}"#,
        );
        assert_eq!(payload, SyncPayload::new().with_consumption_power(100.0));
    }

    #[test]
    fn lifecycle_update_is_extracted() {
        let payload = normalize(
            TopicKind::LifecycleUpdated,
            br#"{"configurationPropertyValues":[{"propertySpecName":"led.brightness","value":"42"}]}"#,
        );
        assert_eq!(payload.led_brightness, Some(Brightness::clamped(42)));
    }

    #[test]
    fn lifecycle_update_does_not_pass_through_other_fields() {
        let payload = normalize(TopicKind::LifecycleUpdated, br#"{"consumptionPower": 10}"#);
        assert!(payload.is_blank());
    }

    #[test]
    fn unrecognized_topic_yields_blank_payload() {
        assert!(normalize(TopicKind::Unrecognized, br#"{"consumptionPower": 10}"#).is_blank());
    }

    #[test]
    fn undecodable_payload_yields_blank_payload() {
        assert!(normalize(TopicKind::LifecycleUpdated, b"{").is_blank());
    }

    #[test]
    fn led_query_requires_led_id() {
        assert!(normalize_led_query(None, 50.0).is_blank());
        assert!(normalize_led_query(Some(""), 50.0).is_blank());
        assert_eq!(
            normalize_led_query(Some("led-1"), 50.0).led_brightness,
            Some(Brightness::clamped(50))
        );
    }
}
