// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle-update envelopes.
//!
//! When a charging station's configuration changes, the cloud publishes an
//! `updated` message carrying the full list of configuration properties.
//! Only the LED brightness is mirrored locally.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::types::Brightness;

use super::SyncPayload;

/// Suffix identifying the LED brightness property.
const BRIGHTNESS_SUFFIX: &str = "brightness";

/// A lifecycle-update envelope.
///
/// # Examples
///
/// ```
/// use homesync_lib::payload::UpdateMessage;
///
/// let message = UpdateMessage::from_json(br#"{
///     "configurationPropertyValues": [
///         {"propertySpecName": "etc.smart.device.type.car.charger.led.config.brightness", "value": "42"}
///     ]
/// }"#).unwrap();
///
/// let payload = message.to_sync_payload();
/// assert_eq!(payload.led_brightness.unwrap().value(), 42);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessage {
    /// Configuration property entries, in publication order.
    #[serde(default)]
    pub configuration_property_values: Option<Vec<PropertyValue>>,
}

/// A single configuration property entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    /// Fully qualified property name.
    #[serde(default)]
    pub property_spec_name: Option<String>,
    /// Property value, usually a string.
    #[serde(default)]
    pub value: Value,
}

impl UpdateMessage {
    /// Decodes an update envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the bytes are not a JSON object of the
    /// expected shape.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(bytes).map_err(ParseError::from)
    }

    /// Extracts the fields mirrored locally.
    ///
    /// Every entry whose name ends with `brightness` sets the LED
    /// brightness; the last one wins. Entries without a name are skipped.
    #[must_use]
    pub fn to_sync_payload(&self) -> SyncPayload {
        let mut payload = SyncPayload::new();

        for property in self.configuration_property_values.iter().flatten() {
            let Some(name) = property
                .property_spec_name
                .as_deref()
                .filter(|name| !name.trim().is_empty())
            else {
                continue;
            };

            if name.ends_with(BRIGHTNESS_SUFFIX) {
                payload.led_brightness = Some(Brightness::from_number(numeric_value(
                    &property.value,
                )));
            }
        }

        payload
    }
}

/// Interprets a JSON value as a number.
///
/// Numbers are taken as-is, strings are parsed after trimming (an empty
/// string is 0), booleans map to 1 and 0. Anything else is not numeric and
/// yields 0.
// TODO: reject non-numeric brightness values instead of defaulting to 0
// once the cloud's update payloads are confirmed to always carry numbers.
pub(crate) fn numeric_value(value: &Value) -> f64 {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                Some(0.0)
            } else {
                text.parse::<f64>().ok()
            }
        }
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    number.filter(|n| !n.is_nan()).unwrap_or(0.0)
}
