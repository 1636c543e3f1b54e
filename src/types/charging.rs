// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Charging station state and mode types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Charging state reported by a charging station connector.
///
/// Only `STOPPED` carries meaning for reconciliation: every other state
/// (`CHARGING`, `PAUSED`, ...) implies a connected cable. The comparison
/// is case-sensitive, matching what the station publishes.
///
/// # Examples
///
/// ```
/// use homesync_lib::types::ChargingState;
///
/// assert!(!ChargingState::from("STOPPED").is_cable_connected());
/// assert!(ChargingState::from("CHARGING").is_cable_connected());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargingState {
    /// No charging session, cable unplugged.
    Stopped,
    /// Any other reported state.
    Other(String),
}

impl ChargingState {
    /// Wire value of the stopped state.
    pub const STOPPED: &'static str = "STOPPED";

    /// Returns `true` when the state implies a connected cable.
    #[must_use]
    pub fn is_cable_connected(&self) -> bool {
        !matches!(self, Self::Stopped)
    }

    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stopped => Self::STOPPED,
            Self::Other(state) => state,
        }
    }
}

impl From<String> for ChargingState {
    fn from(value: String) -> Self {
        if value == Self::STOPPED {
            Self::Stopped
        } else {
            Self::Other(value)
        }
    }
}

impl From<&str> for ChargingState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ChargingState> for String {
    fn from(value: ChargingState) -> Self {
        match value {
            ChargingState::Stopped => ChargingState::STOPPED.to_string(),
            ChargingState::Other(state) => state,
        }
    }
}

impl fmt::Display for ChargingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charging mode of a charging station connector.
///
/// Stations publish modes in upper case (`ECO`, `STANDARD`, ...) while the
/// `charging_mode` capability stores them in lower case. The mode is
/// normalized to lower case on construction so both sides compare equal.
///
/// # Examples
///
/// ```
/// use homesync_lib::types::ChargingMode;
///
/// let mode: ChargingMode = "ECO".parse().unwrap();
/// assert_eq!(mode.as_str(), "eco");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChargingMode(String);

impl ChargingMode {
    /// Creates a charging mode, lower-casing the input.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::BlankChargingMode` if the input is blank.
    pub fn new(mode: &str) -> Result<Self, ValueError> {
        let mode = mode.trim();
        if mode.is_empty() {
            return Err(ValueError::BlankChargingMode);
        }
        Ok(Self(mode.to_lowercase()))
    }

    /// Returns the lower-case mode.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChargingMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// Blank strings are filtered out before deserialization reaches this impl.
impl From<String> for ChargingMode {
    fn from(value: String) -> Self {
        Self(value.trim().to_lowercase())
    }
}

impl From<ChargingMode> for String {
    fn from(value: ChargingMode) -> Self {
        value.0
    }
}

impl fmt::Display for ChargingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_means_unplugged() {
        assert_eq!(ChargingState::from("STOPPED"), ChargingState::Stopped);
        assert!(!ChargingState::Stopped.is_cable_connected());
    }

    #[test]
    fn any_other_state_means_plugged() {
        for state in ["CHARGING", "PAUSED", "SUSPENDED", "stopped"] {
            assert!(ChargingState::from(state).is_cable_connected(), "{state}");
        }
    }

    #[test]
    fn charging_state_round_trips_through_json() {
        let state: ChargingState = serde_json::from_str(r#""CHARGING""#).unwrap();
        assert_eq!(state.as_str(), "CHARGING");
        assert_eq!(serde_json::to_string(&state).unwrap(), r#""CHARGING""#);
    }

    #[test]
    fn charging_mode_is_lower_cased() {
        assert_eq!(ChargingMode::new("ECO").unwrap().as_str(), "eco");
        assert_eq!(ChargingMode::new(" Smart ").unwrap().as_str(), "smart");
        assert_eq!(
            ChargingMode::new("STANDARD").unwrap(),
            ChargingMode::new("standard").unwrap()
        );
    }

    #[test]
    fn blank_charging_mode_is_rejected() {
        assert_eq!(ChargingMode::new("  "), Err(ValueError::BlankChargingMode));
    }

    #[test]
    fn charging_mode_deserializes_lower_case() {
        let mode: ChargingMode = serde_json::from_str(r#""SOLAR""#).unwrap();
        assert_eq!(mode.to_string(), "solar");
    }
}
