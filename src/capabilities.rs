// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capabilities.
//!
//! A capability is a piece of live state the host platform shows for a
//! device (a power reading, a cable indicator, a mode picker). The set of
//! capabilities a device declares is decided by the host at pairing time;
//! the reconciler only writes a field when its capability is declared.

use std::fmt;
use std::str::FromStr;

/// A capability the reconciler can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Current consumption in Watts (`measure_power`).
    MeasurePower,
    /// Always-on consumption in Watts (`measure_power.alwayson`).
    MeasurePowerAlwaysOn,
    /// Whether a cable is plugged into the connector (`cable_connected`).
    CableConnected,
    /// Charging mode of the connector (`charging_mode`).
    ChargingMode,
}

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::MeasurePower,
        Self::MeasurePowerAlwaysOn,
        Self::CableConnected,
        Self::ChargingMode,
    ];

    /// Returns the host platform identifier of the capability.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::MeasurePower => "measure_power",
            Self::MeasurePowerAlwaysOn => "measure_power.alwayson",
            Self::CableConnected => "cable_connected",
            Self::ChargingMode => "charging_mode",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Capability {
    type Err = crate::error::DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.id() == s)
            .ok_or_else(|| crate::error::DeviceError::UnsupportedCapability {
                capability: s.to_string(),
            })
    }
}

/// Set of capabilities declared for a device.
///
/// # Examples
///
/// ```
/// use homesync_lib::{Capabilities, Capability};
///
/// let meter = Capabilities::energy_meter();
/// assert!(meter.contains(Capability::MeasurePower));
/// assert!(!meter.contains(Capability::CableConnected));
///
/// let custom = Capabilities::builder()
///     .with(Capability::CableConnected)
///     .build();
/// assert_eq!(custom.iter().count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
// Each boolean is an independent capability flag declared by the host.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Declares `measure_power`.
    pub measure_power: bool,
    /// Declares `measure_power.alwayson`.
    pub measure_power_always_on: bool,
    /// Declares `cable_connected`.
    pub cable_connected: bool,
    /// Declares `charging_mode`.
    pub charging_mode: bool,
}

impl Capabilities {
    /// Capabilities of an energy meter.
    #[must_use]
    pub const fn energy_meter() -> Self {
        Self {
            measure_power: true,
            measure_power_always_on: true,
            cable_connected: false,
            charging_mode: false,
        }
    }

    /// Capabilities of an EV wall charger connector.
    #[must_use]
    pub const fn ev_wall() -> Self {
        Self {
            measure_power: true,
            measure_power_always_on: true,
            cable_connected: true,
            charging_mode: true,
        }
    }

    /// Returns a builder starting from an empty set.
    #[must_use]
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }

    /// Returns `true` if the capability is declared.
    #[must_use]
    pub const fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::MeasurePower => self.measure_power,
            Capability::MeasurePowerAlwaysOn => self.measure_power_always_on,
            Capability::CableConnected => self.cable_connected,
            Capability::ChargingMode => self.charging_mode,
        }
    }

    /// Iterates over the declared capabilities.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(|capability| self.contains(*capability))
    }
}

/// Builder for a custom capability set.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    capabilities: Capabilities,
}

impl CapabilitiesBuilder {
    /// Declares a capability.
    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::MeasurePower => self.capabilities.measure_power = true,
            Capability::MeasurePowerAlwaysOn => self.capabilities.measure_power_always_on = true,
            Capability::CableConnected => self.capabilities.cable_connected = true,
            Capability::ChargingMode => self.capabilities.charging_mode = true,
        }
        self
    }

    /// Builds the capability set.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.capabilities
    }
}
