// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED brightness type.
//!
//! Charging stations expose the brightness of their status LED as a
//! percentage. Values coming from the transport and the remote API are
//! plain JSON numbers, so [`Brightness`] accepts any number and clamps it
//! into the valid range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// LED brightness as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use homesync_lib::types::Brightness;
///
/// let led = Brightness::new(75).unwrap();
/// assert_eq!(led.value(), 75);
///
/// // Numbers from the wire are clamped and rounded
/// assert_eq!(Brightness::from_number(42.4).value(), 42);
/// assert_eq!(Brightness::from_number(180.0).value(), 100);
///
/// // Invalid values return error
/// assert!(Brightness::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Brightness(u8);

impl Brightness {
    /// LED off (0%).
    pub const MIN: Self = Self(0);

    /// Full brightness (100%).
    pub const MAX: Self = Self(100);

    /// Creates a new brightness value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a brightness value, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Creates a brightness from an arbitrary number.
    ///
    /// The number is rounded and clamped to 0-100. `NaN` maps to 0, the
    /// same default used for non-numeric lifecycle values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_number(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        // Safe: clamped to [0, 100] before the cast
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    /// Returns the brightness percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<f64> for Brightness {
    fn from(value: f64) -> Self {
        Self::from_number(value)
    }
}

impl From<Brightness> for f64 {
    fn from(value: Brightness) -> Self {
        f64::from(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_invalid_value() {
        assert!(Brightness::new(101).is_err());
        assert_eq!(Brightness::new(100).unwrap(), Brightness::MAX);
    }

    #[test]
    fn brightness_clamped() {
        assert_eq!(Brightness::clamped(50).value(), 50);
        assert_eq!(Brightness::clamped(255).value(), 100);
    }

    #[test]
    fn from_number_rounds_and_clamps() {
        assert_eq!(Brightness::from_number(42.0).value(), 42);
        assert_eq!(Brightness::from_number(42.6).value(), 43);
        assert_eq!(Brightness::from_number(-5.0).value(), 0);
        assert_eq!(Brightness::from_number(250.0).value(), 100);
        assert_eq!(Brightness::from_number(f64::NAN).value(), 0);
        assert_eq!(Brightness::from_number(f64::INFINITY).value(), 100);
    }

    #[test]
    fn deserializes_from_json_number() {
        let led: Brightness = serde_json::from_str("64").unwrap();
        assert_eq!(led.value(), 64);

        let led: Brightness = serde_json::from_str("12.5").unwrap();
        assert_eq!(led.value(), 13);
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&Brightness::clamped(30)).unwrap();
        assert_eq!(json, "30.0");
    }

    #[test]
    fn brightness_display() {
        assert_eq!(Brightness::clamped(75).to_string(), "75%");
    }
}
