// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical sync payload.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::{Brightness, ChargingMode, ChargingState};

/// Maximum number of characters of a payload written to debug logs.
const LOG_PREVIEW_LEN: usize = 150;

/// A field of the canonical sync payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncField {
    /// `consumptionPower`
    ConsumptionPower,
    /// `alwaysOnPower`
    AlwaysOnPower,
    /// `chargingState`
    ChargingState,
    /// `chargingMode`
    ChargingMode,
    /// `ledBrightness`
    LedBrightness,
    /// `available`
    Available,
}

impl SyncField {
    /// Returns the JSON name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsumptionPower => "consumptionPower",
            Self::AlwaysOnPower => "alwaysOnPower",
            Self::ChargingState => "chargingState",
            Self::ChargingMode => "chargingMode",
            Self::LedBrightness => "ledBrightness",
            Self::Available => "available",
        }
    }
}

impl fmt::Display for SyncField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical field set every inbound source is normalized into.
///
/// Every field is optional and an absent field means "no information":
/// it never resets the corresponding capability. A payload with no field
/// set is [blank](Self::is_blank) and reconciling it is a no-op.
///
/// Fields are decoded independently: a field whose value has the wrong
/// type is logged and treated as absent, the other fields are kept.
///
/// # Examples
///
/// ```
/// use homesync_lib::payload::SyncPayload;
///
/// let payload = SyncPayload::from_json(br#"{"consumptionPower": 1250.5}"#).unwrap();
/// assert_eq!(payload.consumption_power, Some(1250.5));
/// assert_eq!(payload.always_on_power, None);
///
/// let payload = SyncPayload::from_json(br#"{"consumptionPower": 90, "available": "yes"}"#).unwrap();
/// assert_eq!(payload.consumption_power, Some(90.0));
/// assert_eq!(payload.available, None);
///
/// assert!(SyncPayload::from_json(b"{}").unwrap().is_blank());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    /// Current consumption in Watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumption_power: Option<f64>,

    /// Always-on consumption in Watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_on_power: Option<f64>,

    /// Connector charging state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_state: Option<ChargingState>,

    /// Connector charging mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_mode: Option<ChargingMode>,

    /// Status LED brightness.
    ///
    /// Stored as a whole percentage: wire values are rounded to the
    /// nearest integer, so `42.6` becomes `43`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_brightness: Option<Brightness>,

    /// Whether the device is reachable by the cloud.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl<'de> Deserialize<'de> for SyncPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_object(&object))
    }
}

impl SyncPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a payload from JSON bytes.
    ///
    /// Unknown fields are ignored, `null` counts as absent and a field of
    /// the wrong type is dropped on its own. The canonical name wins over
    /// a legacy alias; for a repeated key the last occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the bytes are not a JSON object.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(bytes).map_err(ParseError::from)
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            consumption_power: field(object, SyncField::ConsumptionPower, &[]),
            always_on_power: field(object, SyncField::AlwaysOnPower, &["alwaysOn"]),
            charging_state: non_blank(object, SyncField::ChargingState),
            charging_mode: non_blank(object, SyncField::ChargingMode),
            led_brightness: field::<f64>(object, SyncField::LedBrightness, &["led_brightness"])
                .map(Brightness::from_number),
            available: field(object, SyncField::Available, &[]),
        }
    }

    /// Sets the consumption power.
    #[must_use]
    pub fn with_consumption_power(mut self, watts: f64) -> Self {
        self.consumption_power = Some(watts);
        self
    }

    /// Sets the always-on power.
    #[must_use]
    pub fn with_always_on_power(mut self, watts: f64) -> Self {
        self.always_on_power = Some(watts);
        self
    }

    /// Sets the charging state.
    #[must_use]
    pub fn with_charging_state(mut self, state: impl Into<ChargingState>) -> Self {
        self.charging_state = Some(state.into());
        self
    }

    /// Sets the charging mode.
    #[must_use]
    pub fn with_charging_mode(mut self, mode: ChargingMode) -> Self {
        self.charging_mode = Some(mode);
        self
    }

    /// Sets the LED brightness.
    #[must_use]
    pub fn with_led_brightness(mut self, brightness: Brightness) -> Self {
        self.led_brightness = Some(brightness);
        self
    }

    /// Sets the availability.
    #[must_use]
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields().is_empty()
    }

    /// Returns the fields that are present.
    #[must_use]
    pub fn fields(&self) -> Vec<SyncField> {
        let present = [
            (SyncField::ConsumptionPower, self.consumption_power.is_some()),
            (SyncField::AlwaysOnPower, self.always_on_power.is_some()),
            (SyncField::ChargingState, self.charging_state.is_some()),
            (SyncField::ChargingMode, self.charging_mode.is_some()),
            (SyncField::LedBrightness, self.led_brightness.is_some()),
            (SyncField::Available, self.available.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(field, set)| set.then_some(field))
            .collect()
    }

    /// Returns the payload as JSON, truncated for log output.
    #[must_use]
    pub fn log_preview(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        json.chars().take(LOG_PREVIEW_LEN).collect()
    }
}

/// Decodes one field, trying the canonical name before its aliases.
///
/// Values that do not decode as `T` are logged and skipped.
fn field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    name: SyncField,
    aliases: &[&str],
) -> Option<T> {
    std::iter::once(name.as_str())
        .chain(aliases.iter().copied())
        .filter_map(|key| object.get(key))
        .filter(|value| !value.is_null())
        .find_map(|value| match T::deserialize(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(field = %name, error = %e, "Ignoring undecodable field");
                None
            }
        })
}

/// Decodes a string field, treating blank strings as absent.
fn non_blank<T: From<String>>(object: &Map<String, Value>, name: SyncField) -> Option<T> {
    field::<String>(object, name, &[])
        .filter(|value| !value.trim().is_empty())
        .map(T::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_telemetry() {
        let payload = SyncPayload::from_json(
            br#"{
                "consumptionPower": 7200,
                "alwaysOnPower": 12.5,
                "chargingState": "CHARGING",
                "chargingMode": "SMART",
                "ledBrightness": 70,
                "available": true
            }"#,
        )
        .unwrap();

        assert_eq!(payload.consumption_power, Some(7200.0));
        assert_eq!(payload.always_on_power, Some(12.5));
        assert_eq!(
            payload.charging_state,
            Some(ChargingState::Other("CHARGING".to_string()))
        );
        assert_eq!(payload.charging_mode.as_ref().unwrap().as_str(), "smart");
        assert_eq!(payload.led_brightness, Some(Brightness::clamped(70)));
        assert_eq!(payload.available, Some(true));
        assert_eq!(payload.fields().len(), 6);
    }

    #[test]
    fn accepts_legacy_field_names() {
        let payload = SyncPayload::from_json(br#"{"alwaysOn": 8, "led_brightness": 20}"#).unwrap();
        assert_eq!(payload.always_on_power, Some(8.0));
        assert_eq!(payload.led_brightness, Some(Brightness::clamped(20)));
    }

    #[test]
    fn null_and_blank_strings_are_absent() {
        let payload = SyncPayload::from_json(
            br#"{"consumptionPower": null, "chargingState": "", "chargingMode": "  "}"#,
        )
        .unwrap();
        assert!(payload.is_blank());
    }

    #[test]
    fn zero_and_false_are_present() {
        let payload = SyncPayload::from_json(br#"{"consumptionPower": 0, "available": false}"#)
            .unwrap();
        assert!(!payload.is_blank());
        assert_eq!(
            payload.fields(),
            vec![SyncField::ConsumptionPower, SyncField::Available]
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload =
            SyncPayload::from_json(br#"{"serviceLocationId": 1234, "utcTimeStamp": 1}"#).unwrap();
        assert!(payload.is_blank());
    }

    #[test]
    fn bad_field_does_not_drop_good_ones() {
        let payload =
            SyncPayload::from_json(br#"{"consumptionPower": 100, "available": "true"}"#).unwrap();
        assert_eq!(payload.consumption_power, Some(100.0));
        assert_eq!(payload.available, None);

        let payload =
            SyncPayload::from_json(br#"{"chargingState": "CHARGING", "ledBrightness": "42"}"#)
                .unwrap();
        assert_eq!(
            payload.charging_state,
            Some(ChargingState::Other("CHARGING".to_string()))
        );
        assert_eq!(payload.led_brightness, None);

        let payload =
            SyncPayload::from_json(br#"{"alwaysOnPower": {"w": 1}, "chargingMode": 3}"#).unwrap();
        assert!(payload.is_blank());
    }

    #[test]
    fn canonical_name_and_alias_together() {
        let payload =
            SyncPayload::from_json(br#"{"alwaysOn": 8, "alwaysOnPower": 12}"#).unwrap();
        assert_eq!(payload.always_on_power, Some(12.0));

        // An undecodable canonical value falls back to the alias
        let payload =
            SyncPayload::from_json(br#"{"alwaysOnPower": "n/a", "alwaysOn": 8}"#).unwrap();
        assert_eq!(payload.always_on_power, Some(8.0));
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let payload =
            SyncPayload::from_json(br#"{"consumptionPower": 1, "consumptionPower": 2}"#).unwrap();
        assert_eq!(payload.consumption_power, Some(2.0));
    }

    #[test]
    fn fractional_brightness_is_rounded() {
        let payload = SyncPayload::from_json(br#"{"ledBrightness": 42.6}"#).unwrap();
        assert_eq!(payload.led_brightness, Some(Brightness::clamped(43)));
    }

    #[test]
    fn rejects_non_object() {
        assert!(SyncPayload::from_json(b"not json").is_err());
        assert!(SyncPayload::from_json(b"42").is_err());
    }

    #[test]
    fn log_preview_is_truncated() {
        let payload = SyncPayload::new()
            .with_consumption_power(1.0)
            .with_charging_state("X".repeat(300).as_str());
        assert_eq!(payload.log_preview().chars().count(), 150);
    }

    #[test]
    fn serializes_only_present_fields() {
        let payload = SyncPayload::new().with_available(false);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"available":false}"#
        );
    }
}
