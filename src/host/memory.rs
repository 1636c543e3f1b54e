// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory host platform.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::capabilities::{Capabilities, Capability};
use crate::error::PlatformError;

use super::{HostPlatform, MessageKey, Messages, PlatformValue, SettingKey};

/// Availability of a device as shown by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Availability {
    /// The device is usable.
    #[default]
    Available,
    /// The device is unusable, with the reason shown to the user.
    Unavailable(String),
}

impl Availability {
    /// Returns `true` if the device is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    capability_values: HashMap<Capability, PlatformValue>,
    settings: HashMap<SettingKey, PlatformValue>,
    availability: Availability,
    warning: Option<String>,
    warning_clears: usize,
    writes: usize,
    failing_capabilities: HashSet<Capability>,
    failing_settings: bool,
}

/// Host platform keeping everything in memory.
///
/// Besides the [`HostPlatform`] write side it exposes read-back accessors
/// and failure injection, which makes it the reference host for tests.
///
/// # Examples
///
/// ```
/// use homesync_lib::host::{HostPlatform, MemoryPlatform, PlatformValue};
/// use homesync_lib::{Capabilities, Capability};
///
/// # async fn example() {
/// let platform = MemoryPlatform::new(Capabilities::energy_meter());
/// platform
///     .set_capability_value(Capability::MeasurePower, PlatformValue::from(120.0))
///     .await
///     .unwrap();
///
/// assert_eq!(
///     platform.capability_value(Capability::MeasurePower),
///     Some(PlatformValue::Number(120.0))
/// );
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryPlatform {
    capabilities: Capabilities,
    messages: Messages,
    state: Mutex<MemoryState>,
}

impl MemoryPlatform {
    /// Creates a platform declaring the given capabilities.
    #[must_use]
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            messages: Messages::default(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Replaces the message table.
    #[must_use]
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Returns the declared capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the last value written to a capability.
    #[must_use]
    pub fn capability_value(&self, capability: Capability) -> Option<PlatformValue> {
        self.state.lock().capability_values.get(&capability).cloned()
    }

    /// Returns the last value written to a setting.
    #[must_use]
    pub fn setting(&self, key: SettingKey) -> Option<PlatformValue> {
        self.state.lock().settings.get(&key).cloned()
    }

    /// Returns the current availability.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.state.lock().availability.clone()
    }

    /// Raises a warning banner, as the host does when a device stops
    /// responding.
    pub fn set_warning(&self, message: impl Into<String>) {
        self.state.lock().warning = Some(message.into());
    }

    /// Returns the pending warning, if any.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        self.state.lock().warning.clone()
    }

    /// Returns how many times the warning was cleared.
    #[must_use]
    pub fn warning_clear_count(&self) -> usize {
        self.state.lock().warning_clears
    }

    /// Returns how many capability, setting and availability writes
    /// succeeded.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Makes every write to a capability fail.
    pub fn fail_capability_writes(&self, capability: Capability) {
        self.state.lock().failing_capabilities.insert(capability);
    }

    /// Makes every settings write fail (or succeed again).
    pub fn fail_setting_writes(&self, fail: bool) {
        self.state.lock().failing_settings = fail;
    }
}

impl HostPlatform for MemoryPlatform {
    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    async fn set_capability_value(
        &self,
        capability: Capability,
        value: PlatformValue,
    ) -> Result<(), PlatformError> {
        if !self.capabilities.contains(capability) {
            return Err(PlatformError::WriteFailed {
                target: capability.to_string(),
                reason: "capability not declared".to_string(),
            });
        }

        let mut state = self.state.lock();
        if state.failing_capabilities.contains(&capability) {
            return Err(PlatformError::WriteFailed {
                target: capability.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        state.capability_values.insert(capability, value);
        state.writes += 1;
        Ok(())
    }

    async fn set_setting(
        &self,
        key: SettingKey,
        value: PlatformValue,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if state.failing_settings {
            return Err(PlatformError::WriteFailed {
                target: key.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        state.settings.insert(key, value);
        state.writes += 1;
        Ok(())
    }

    async fn set_available(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.availability = Availability::Available;
        state.writes += 1;
        Ok(())
    }

    async fn set_unavailable(&self, reason: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.availability = Availability::Unavailable(reason.to_string());
        state.writes += 1;
        Ok(())
    }

    async fn unset_warning(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.warning = None;
        state.warning_clears += 1;
        Ok(())
    }

    fn translate(&self, key: MessageKey) -> String {
        self.messages.get(key).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_are_readable() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());

        platform
            .set_capability_value(Capability::CableConnected, PlatformValue::from(true))
            .await
            .unwrap();
        platform
            .set_setting(SettingKey::LedBrightness, PlatformValue::from(40.0))
            .await
            .unwrap();

        assert_eq!(
            platform.capability_value(Capability::CableConnected),
            Some(PlatformValue::Bool(true))
        );
        assert_eq!(
            platform.setting(SettingKey::LedBrightness),
            Some(PlatformValue::Number(40.0))
        );
        assert_eq!(platform.write_count(), 2);
    }

    #[tokio::test]
    async fn undeclared_capability_write_fails() {
        let platform = MemoryPlatform::new(Capabilities::energy_meter());
        let result = platform
            .set_capability_value(Capability::ChargingMode, PlatformValue::from("eco"))
            .await;
        assert!(result.is_err());
        assert_eq!(platform.write_count(), 0);
    }

    #[tokio::test]
    async fn injected_failures() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());
        platform.fail_capability_writes(Capability::MeasurePower);
        platform.fail_setting_writes(true);

        assert!(
            platform
                .set_capability_value(Capability::MeasurePower, PlatformValue::from(1.0))
                .await
                .is_err()
        );
        assert!(
            platform
                .set_setting(SettingKey::LedBrightness, PlatformValue::from(1.0))
                .await
                .is_err()
        );
        assert_eq!(platform.capability_value(Capability::MeasurePower), None);
    }

    #[tokio::test]
    async fn availability_and_warning() {
        let platform = MemoryPlatform::new(Capabilities::default());
        platform.set_warning("Device not responding");

        platform.set_unavailable("offline").await.unwrap();
        assert_eq!(
            platform.availability(),
            Availability::Unavailable("offline".to_string())
        );

        platform.set_available().await.unwrap();
        platform.unset_warning().await.unwrap();
        assert!(platform.availability().is_available());
        assert_eq!(platform.warning(), None);
        assert_eq!(platform.warning_clear_count(), 1);
    }

    #[test]
    fn custom_messages() {
        let platform = MemoryPlatform::new(Capabilities::default()).with_messages(Messages {
            unavailable: "Nicht erreichbar".to_string(),
            ..Messages::default()
        });
        assert_eq!(platform.translate(MessageKey::Unavailable), "Nicht erreichbar");
    }
}
