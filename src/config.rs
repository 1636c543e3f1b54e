// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration.

use serde::{Deserialize, Serialize};

use crate::device_kind::DeviceKind;
use crate::error::ConfigError;

/// Identifiers established at pairing time.
///
/// They are read-only for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Remote service location id.
    pub service_location_id: String,
    /// Hardware id of the status LED, if the device has one.
    #[serde(default)]
    pub led_id: Option<String>,
    /// Serial number of the charging station.
    #[serde(default)]
    pub station_serial: Option<String>,
    /// Connector position on the charging station.
    #[serde(default)]
    pub position: Option<u32>,
}

impl DeviceIdentity {
    /// Returns the LED id, treating a blank id as absent.
    #[must_use]
    pub fn led_id(&self) -> Option<&str> {
        non_blank(self.led_id.as_deref())
    }

    /// Returns the station serial number and connector position.
    #[must_use]
    pub fn station(&self) -> Option<(&str, u32)> {
        non_blank(self.station_serial.as_deref()).zip(self.position)
    }
}

/// Configuration of a synchronized device.
///
/// # Examples
///
/// ```
/// use homesync_lib::config::DeviceConfig;
///
/// let meter = DeviceConfig::energy_meter("1234")
///     .with_friendly_name("Main meter");
/// assert_eq!(meter.subscription_filter(), "servicelocation/1234/power");
///
/// let wall = DeviceConfig::ev_wall("1234", "5010012345", 1)
///     .with_led_id("led-7");
/// assert_eq!(wall.subscription_filter(), "servicelocation/1234/#");
///
/// let loaded = DeviceConfig::from_json(r#"{
///     "kind": "ev_wall",
///     "identity": {"service_location_id": "1234", "station_serial": "5010012345", "position": 1}
/// }"#).unwrap();
/// assert_eq!(loaded.identity.position, Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Kind of device.
    pub kind: DeviceKind,
    /// Pairing-time identifiers.
    pub identity: DeviceIdentity,
    /// MQTT topic base; defaults to `servicelocation/<service_location_id>`.
    #[serde(default)]
    pub topic_base: Option<String>,
    /// Optional friendly name used in logs.
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl DeviceConfig {
    /// Creates a configuration for an energy meter.
    #[must_use]
    pub fn energy_meter(service_location_id: impl Into<String>) -> Self {
        Self {
            kind: DeviceKind::EnergyMeter,
            identity: DeviceIdentity {
                service_location_id: service_location_id.into(),
                ..DeviceIdentity::default()
            },
            topic_base: None,
            friendly_name: None,
        }
    }

    /// Creates a configuration for an EV wall charger connector.
    #[must_use]
    pub fn ev_wall(
        service_location_id: impl Into<String>,
        station_serial: impl Into<String>,
        position: u32,
    ) -> Self {
        Self {
            kind: DeviceKind::EvWall,
            identity: DeviceIdentity {
                service_location_id: service_location_id.into(),
                led_id: None,
                station_serial: Some(station_serial.into()),
                position: Some(position),
            },
            topic_base: None,
            friendly_name: None,
        }
    }

    /// Loads a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the configuration invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the LED id.
    #[must_use]
    pub fn with_led_id(mut self, led_id: impl Into<String>) -> Self {
        self.identity.led_id = Some(led_id.into());
        self
    }

    /// Overrides the MQTT topic base.
    #[must_use]
    pub fn with_topic_base(mut self, base: impl Into<String>) -> Self {
        self.topic_base = Some(base.into());
        self
    }

    /// Sets a friendly name for the device.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Checks that the identifiers required by the device kind are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` naming the first missing field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.service_location_id.trim().is_empty() {
            return Err(ConfigError::MissingField("service_location_id"));
        }

        if self.kind == DeviceKind::EvWall {
            if non_blank(self.identity.station_serial.as_deref()).is_none() {
                return Err(ConfigError::MissingField("station_serial"));
            }
            if self.identity.position.is_none() {
                return Err(ConfigError::MissingField("position"));
            }
        }

        if let Some(base) = &self.topic_base
            && (base.contains('#') || base.contains('+'))
        {
            return Err(ConfigError::InvalidValue {
                field: "topic_base",
                message: format!("'{base}' must not contain MQTT wildcards"),
            });
        }

        Ok(())
    }

    /// Returns the MQTT topic base of the device.
    #[must_use]
    pub fn topic_base(&self) -> String {
        self.topic_base.clone().unwrap_or_else(|| {
            format!("servicelocation/{}", self.identity.service_location_id)
        })
    }

    /// Returns the full MQTT subscription filter of the device.
    #[must_use]
    pub fn subscription_filter(&self) -> String {
        self.kind.subscription_topic().filter(&self.topic_base())
    }

    /// Returns the name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        self.friendly_name
            .as_deref()
            .unwrap_or(&self.identity.service_location_id)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_meter_defaults() {
        let config = DeviceConfig::energy_meter("42");
        assert_eq!(config.kind, DeviceKind::EnergyMeter);
        assert_eq!(config.topic_base(), "servicelocation/42");
        assert_eq!(config.name(), "42");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_topic_base() {
        let config = DeviceConfig::ev_wall("42", "SN", 2).with_topic_base("site/garage");
        assert_eq!(config.subscription_filter(), "site/garage/#");
    }

    #[test]
    fn blank_led_id_is_absent() {
        let config = DeviceConfig::ev_wall("42", "SN", 1).with_led_id("  ");
        assert_eq!(config.identity.led_id(), None);

        let config = DeviceConfig::ev_wall("42", "SN", 1).with_led_id("led");
        assert_eq!(config.identity.led_id(), Some("led"));
    }

    #[test]
    fn station_requires_serial_and_position() {
        let config = DeviceConfig::ev_wall("42", "SN", 3);
        assert_eq!(config.identity.station(), Some(("SN", 3)));
        assert_eq!(DeviceConfig::energy_meter("42").identity.station(), None);
    }

    #[test]
    fn ev_wall_without_station_is_invalid() {
        let mut config = DeviceConfig::ev_wall("42", "SN", 1);
        config.identity.station_serial = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("station_serial"))
        ));

        let mut config = DeviceConfig::ev_wall("42", "SN", 1);
        config.identity.position = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("position"))
        ));
    }

    #[test]
    fn blank_location_is_invalid() {
        assert!(matches!(
            DeviceConfig::energy_meter(" ").validate(),
            Err(ConfigError::MissingField("service_location_id"))
        ));
    }

    #[test]
    fn wildcard_topic_base_is_invalid() {
        let config = DeviceConfig::energy_meter("42").with_topic_base("site/+");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "topic_base", .. })
        ));
    }

    #[test]
    fn from_json_validates() {
        let result = DeviceConfig::from_json(
            r#"{"kind": "ev_wall", "identity": {"service_location_id": "1"}}"#,
        );
        assert!(matches!(result, Err(ConfigError::MissingField(_))));

        let result = DeviceConfig::from_json("{");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn from_json_energy_meter() {
        let config = DeviceConfig::from_json(
            r#"{"kind": "energy_meter", "identity": {"service_location_id": "77"}, "friendly_name": "Meter"}"#,
        )
        .unwrap();
        assert_eq!(config.name(), "Meter");
        assert_eq!(config.subscription_filter(), "servicelocation/77/power");
    }
}
