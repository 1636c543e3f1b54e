// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-initiated changes coming from the host platform.

use serde_json::Value;

use crate::capabilities::Capability;
use crate::error::{DeviceError, Error, ParseError};
use crate::host::{PlatformValue, SettingKey};
use crate::payload::numeric_value;
use crate::types::{Brightness, ChargingMode};

/// Settings the user changed in the host UI.
///
/// Only the keys the user actually changed are set.
///
/// # Examples
///
/// ```
/// use homesync_lib::sync::SettingsChange;
/// use homesync_lib::types::Brightness;
///
/// let change = SettingsChange::from_host(
///     &serde_json::json!({"led_brightness": "60", "charging_mode": "normal"}),
///     &["led_brightness"],
/// )
/// .unwrap();
///
/// assert_eq!(change.led_brightness, Some(Brightness::clamped(60)));
/// assert_eq!(change.charging_mode, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    /// New LED brightness.
    pub led_brightness: Option<Brightness>,
    /// New charging mode.
    pub charging_mode: Option<ChargingMode>,
}

impl SettingsChange {
    /// Host key of the charging mode setting.
    pub const CHARGING_MODE_KEY: &'static str = "charging_mode";

    /// Creates an empty change.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new LED brightness.
    #[must_use]
    pub fn with_led_brightness(mut self, brightness: Brightness) -> Self {
        self.led_brightness = Some(brightness);
        self
    }

    /// Sets the new charging mode.
    #[must_use]
    pub fn with_charging_mode(mut self, mode: ChargingMode) -> Self {
        self.charging_mode = Some(mode);
        self
    }

    /// Builds a change from the host's new settings object and the list of
    /// changed keys. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnexpectedFormat` if a changed key is missing
    /// from `new_settings` or the charging mode is not a non-blank string.
    pub fn from_host(new_settings: &Value, changed_keys: &[&str]) -> Result<Self, ParseError> {
        let mut change = Self::new();

        for key in changed_keys {
            if *key == SettingKey::LedBrightness.as_str() {
                let value = setting_value(new_settings, key)?;
                change.led_brightness = Some(Brightness::from_number(numeric_value(value)));
            } else if *key == Self::CHARGING_MODE_KEY {
                let mode = setting_value(new_settings, key)?
                    .as_str()
                    .and_then(|mode| ChargingMode::new(mode).ok())
                    .ok_or_else(|| {
                        ParseError::UnexpectedFormat(format!(
                            "'{key}' must be a non-blank string"
                        ))
                    })?;
                change.charging_mode = Some(mode);
            } else {
                tracing::trace!(key = %key, "Ignoring unsynchronized setting");
            }
        }

        Ok(change)
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.led_brightness.is_none() && self.charging_mode.is_none()
    }
}

fn setting_value<'a>(settings: &'a Value, key: &str) -> Result<&'a Value, ParseError> {
    settings
        .get(key)
        .ok_or_else(|| ParseError::UnexpectedFormat(format!("changed setting '{key}' is missing")))
}

/// A capability value the user set in the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityCommand {
    /// Switch the connector to another charging mode.
    ChargingMode(ChargingMode),
}

impl CapabilityCommand {
    /// Returns the capability the command targets.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::ChargingMode(_) => Capability::ChargingMode,
        }
    }

    /// Builds a command from a capability listener invocation.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::UnsupportedCapability` if the capability has no
    /// listener, or a `ValueError` if the value has the wrong shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::Capability;
    /// use homesync_lib::host::PlatformValue;
    /// use homesync_lib::sync::CapabilityCommand;
    ///
    /// let command = CapabilityCommand::from_host(
    ///     Capability::ChargingMode,
    ///     &PlatformValue::from("SOLAR"),
    /// )
    /// .unwrap();
    /// assert_eq!(command.capability(), Capability::ChargingMode);
    /// ```
    pub fn from_host(capability: Capability, value: &PlatformValue) -> Result<Self, Error> {
        match capability {
            Capability::ChargingMode => {
                let mode = value.as_str().unwrap_or_default();
                Ok(Self::ChargingMode(ChargingMode::new(mode)?))
            }
            other => Err(DeviceError::UnsupportedCapability {
                capability: other.to_string(),
            }
            .into()),
        }
    }
}
