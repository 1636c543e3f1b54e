// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host platform boundary.
//!
//! The host platform owns the capability store, the device settings, the
//! availability state and the warning banner shown to the user. This
//! crate only writes to it through the [`HostPlatform`] trait.
//!
//! [`MemoryPlatform`] is an in-memory implementation suitable for
//! embedding and testing.

mod memory;

pub use memory::{Availability, MemoryPlatform};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capabilities::Capability;
use crate::error::PlatformError;

/// A value written to a capability or a setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlatformValue {
    /// Boolean value (`cable_connected`).
    Bool(bool),
    /// Numeric value (power readings, LED brightness).
    Number(f64),
    /// Text value (`charging_mode`).
    Text(String),
}

impl PlatformValue {
    /// Returns the value as a number, if it is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PlatformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PlatformValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for PlatformValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for PlatformValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A device setting mirrored from remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Status LED brightness (`led_brightness`).
    LedBrightness,
}

impl SettingKey {
    /// Returns the host platform key of the setting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LedBrightness => "led_brightness",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing messages the host localizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Reason shown when the cloud reports the device unreachable.
    Unavailable,
    /// Error shown when LED brightness is requested without an LED id.
    LedNotSupported,
}

/// Localized message table.
///
/// Defaults to English. Hosts with their own translation system implement
/// [`HostPlatform::translate`] directly instead.
///
/// # Examples
///
/// ```
/// use homesync_lib::host::{MessageKey, Messages};
///
/// let messages: Messages = serde_json::from_str(r#"{"unavailable": "Hors ligne"}"#).unwrap();
/// assert_eq!(messages.get(MessageKey::Unavailable), "Hors ligne");
/// assert_eq!(messages.get(MessageKey::LedNotSupported), Messages::default().led_not_supported);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Text for [`MessageKey::Unavailable`].
    pub unavailable: String,
    /// Text for [`MessageKey::LedNotSupported`].
    pub led_not_supported: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            unavailable: "Device is unavailable".to_string(),
            led_not_supported: "LED brightness is not supported by this device".to_string(),
        }
    }
}

impl Messages {
    /// Returns the text of a message.
    #[must_use]
    pub fn get(&self, key: MessageKey) -> &str {
        match key {
            MessageKey::Unavailable => &self.unavailable,
            MessageKey::LedNotSupported => &self.led_not_supported,
        }
    }
}

/// Write side of the host platform, as seen by one device.
///
/// Writes are best-effort from the reconciler's point of view: a failed
/// write is logged and the next message re-converges the state.
#[allow(async_fn_in_trait)]
pub trait HostPlatform {
    /// Returns `true` if the device declares the capability.
    fn has_capability(&self, capability: Capability) -> bool;

    /// Writes a capability value.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the store rejects the write.
    async fn set_capability_value(
        &self,
        capability: Capability,
        value: PlatformValue,
    ) -> Result<(), PlatformError>;

    /// Writes a device setting.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the store rejects the write.
    async fn set_setting(&self, key: SettingKey, value: PlatformValue)
    -> Result<(), PlatformError>;

    /// Marks the device available.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the host rejects the transition.
    async fn set_available(&self) -> Result<(), PlatformError>;

    /// Marks the device unavailable with a user-facing reason.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the host rejects the transition.
    async fn set_unavailable(&self, reason: &str) -> Result<(), PlatformError>;

    /// Clears any pending warning banner.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError` if the host rejects the write.
    async fn unset_warning(&self) -> Result<(), PlatformError>;

    /// Returns the localized text of a message.
    fn translate(&self, key: MessageKey) -> String;
}
