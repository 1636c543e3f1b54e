// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device synchronization.

use crate::capabilities::Capability;
use crate::config::DeviceConfig;
use crate::error::{DeviceError, Result};
use crate::host::{HostPlatform, MessageKey};
use crate::payload::{SyncField, SyncPayload, normalize, normalize_led_query};
use crate::protocol::{Inbox, TopicKind};
use crate::remote::RemoteApi;
use crate::types::{Brightness, ChargingMode};

use super::{ApplyOutcome, CapabilityCommand, EchoGuard, Reconciler, SettingsChange};

/// A device kept in sync with its cloud counterpart.
///
/// Owns the echo guard and ties the three inbound paths (push messages,
/// pull queries, user changes) to one host platform and one remote API.
///
/// # Examples
///
/// ```
/// use homesync_lib::config::DeviceConfig;
/// use homesync_lib::host::{MemoryPlatform, PlatformValue};
/// use homesync_lib::remote::RemoteApi;
/// use homesync_lib::sync::SyncDevice;
/// use homesync_lib::types::{Brightness, ChargingMode};
/// use homesync_lib::{Capabilities, Capability, error::ApiError};
///
/// struct NoApi;
///
/// impl RemoteApi for NoApi {
///     async fn get_led_brightness(&self, _: &str, _: &str) -> Result<f64, ApiError> {
///         Ok(0.0)
///     }
///     async fn set_led_brightness(&self, _: &str, _: &str, _: Brightness) -> Result<(), ApiError> {
///         Ok(())
///     }
///     async fn set_charging_mode(&self, _: &str, _: u32, _: &ChargingMode) -> Result<(), ApiError> {
///         Ok(())
///     }
/// }
///
/// # async fn example() -> homesync_lib::Result<()> {
/// let device = SyncDevice::new(
///     DeviceConfig::energy_meter("1234"),
///     MemoryPlatform::new(Capabilities::energy_meter()),
///     NoApi,
/// )?;
///
/// device
///     .on_message("servicelocation/1234/power", br#"{"consumptionPower": 980}"#)
///     .await;
///
/// assert_eq!(
///     device.platform().capability_value(Capability::MeasurePower),
///     Some(PlatformValue::Number(980.0))
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SyncDevice<H, A> {
    config: DeviceConfig,
    platform: H,
    api: A,
    echo_guard: EchoGuard,
}

impl<H: HostPlatform, A: RemoteApi> SyncDevice<H, A> {
    /// Creates a synchronized device.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(config: DeviceConfig, platform: H, api: A) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            device = %config.name(),
            kind = ?config.kind,
            filter = %config.subscription_filter(),
            "Device initialized"
        );

        Ok(Self {
            config,
            platform,
            api,
            echo_guard: EchoGuard::new(),
        })
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the host platform.
    #[must_use]
    pub fn platform(&self) -> &H {
        &self.platform
    }

    /// Returns the remote API.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Returns the MQTT filter the device subscribes to.
    #[must_use]
    pub fn subscription_filter(&self) -> String {
        self.config.subscription_filter()
    }

    /// Returns `true` while a settings write is in flight.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.echo_guard.is_raised()
    }

    fn reconciler(&self) -> Reconciler<'_, H> {
        Reconciler::new(&self.platform, self.config.kind, &self.echo_guard)
    }

    /// LED id, if the device kind has an LED and one is configured.
    fn led_id(&self) -> Option<&str> {
        self.config
            .kind
            .supports_led()
            .then(|| self.config.identity.led_id())
            .flatten()
    }

    // ------------------------------------------------------------------------
    // Push path
    // ------------------------------------------------------------------------

    /// Handles a message received on the transport.
    ///
    /// Topics the device kind does not handle are dropped.
    pub async fn on_message(&self, topic: &str, payload: &[u8]) -> ApplyOutcome {
        let kind = TopicKind::classify(topic);

        if !self.config.kind.handles(kind) {
            tracing::trace!(device = %self.config.name(), topic = %topic, "Ignoring topic");
            return ApplyOutcome::Skipped;
        }

        let payload = normalize(kind, payload);
        if !payload.is_blank() {
            tracing::debug!(
                device = %self.config.name(),
                topic = %topic,
                data = %payload.log_preview(),
                "Handle data"
            );
        }

        self.reconciler().apply(&payload).await
    }

    /// Drains a message inbox until its route is gone.
    ///
    /// Messages are handled one at a time, so reconciliation passes of a
    /// device never interleave.
    pub async fn run(&self, mut inbox: Inbox) {
        tracing::debug!(device = %self.config.name(), "Message loop started");

        while let Some(message) = inbox.recv().await {
            self.on_message(&message.topic, &message.payload).await;
        }

        tracing::debug!(device = %self.config.name(), "Message loop stopped");
    }

    // ------------------------------------------------------------------------
    // Pull path
    // ------------------------------------------------------------------------

    /// Queries the remote state the push stream does not carry.
    ///
    /// Returns an empty payload without calling the API when the device has
    /// no LED id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the query fails.
    pub async fn get_sync_data(&self) -> Result<SyncPayload> {
        let Some(led_id) = self.led_id() else {
            return Ok(SyncPayload::new());
        };

        let brightness = self
            .api
            .get_led_brightness(&self.config.identity.service_location_id, led_id)
            .await?;

        Ok(normalize_led_query(Some(led_id), brightness))
    }

    /// Queries the remote state and reconciles it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the query fails.
    pub async fn sync(&self) -> Result<ApplyOutcome> {
        let payload = self.get_sync_data().await?;
        Ok(self.reconciler().apply(&payload).await)
    }

    // ------------------------------------------------------------------------
    // User-initiated paths
    // ------------------------------------------------------------------------

    /// Pushes settings the user changed to the remote API.
    ///
    /// LED brightness echoes are suppressed until the writes finish,
    /// whether they succeed or not.
    ///
    /// # Errors
    ///
    /// Returns the first remote or precondition error; later keys are not
    /// written.
    pub async fn on_settings(&self, change: &SettingsChange) -> Result<()> {
        if change.is_empty() {
            return Ok(());
        }

        let _updating = self.echo_guard.raise();

        tracing::debug!(device = %self.config.name(), "Updating settings");

        if let Some(brightness) = change.led_brightness {
            tracing::debug!(brightness = %brightness, "LED brightness changed");
            self.set_led_brightness(brightness).await?;
        }

        if let Some(mode) = &change.charging_mode {
            self.set_charging_mode(mode).await?;
        }

        Ok(())
    }

    /// Handles a capability value set by the user.
    ///
    /// # Errors
    ///
    /// Returns the remote or precondition error of the command.
    pub async fn on_capability(&self, command: &CapabilityCommand) -> Result<()> {
        match command {
            CapabilityCommand::ChargingMode(mode) => {
                tracing::debug!(mode = %mode, "Charging mode changed");
                self.set_charging_mode(mode).await
            }
        }
    }

    /// Returns the capabilities whose user changes must be routed to
    /// [`on_capability`](Self::on_capability).
    #[must_use]
    pub fn capability_listeners(&self) -> Vec<Capability> {
        let mut listeners = Vec::new();
        if self.config.kind.recognizes(SyncField::ChargingMode)
            && self.platform.has_capability(Capability::ChargingMode)
        {
            listeners.push(Capability::ChargingMode);
        }
        listeners
    }

    /// Sets the brightness of the status LED.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::LedNotSupported` with the localized message if
    /// no LED id is configured, or `Error::Api` if the remote call fails.
    pub async fn set_led_brightness(&self, brightness: Brightness) -> Result<()> {
        let Some(led_id) = self.led_id() else {
            tracing::error!(device = %self.config.name(), "LED brightness not supported");
            return Err(DeviceError::LedNotSupported {
                message: self.platform.translate(MessageKey::LedNotSupported),
            }
            .into());
        };

        tracing::debug!(device = %self.config.name(), brightness = %brightness, "Set LED brightness");

        self.api
            .set_led_brightness(&self.config.identity.service_location_id, led_id, brightness)
            .await?;
        Ok(())
    }

    /// Switches the connector to another charging mode.
    ///
    /// The remote command is issued first; the capability is then written
    /// optimistically and a failed write is only logged.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::StationNotConfigured` if the station serial or
    /// position is missing, or `Error::Api` if the remote call fails.
    pub async fn set_charging_mode(&self, mode: &ChargingMode) -> Result<()> {
        let (serial, position) = self
            .config
            .identity
            .station()
            .ok_or(DeviceError::StationNotConfigured)?;

        tracing::debug!(
            device = %self.config.name(),
            position = position,
            mode = %mode,
            "Set charging mode"
        );

        self.api.set_charging_mode(serial, position, mode).await?;

        if self.platform.has_capability(Capability::ChargingMode)
            && let Err(e) = self
                .platform
                .set_capability_value(Capability::ChargingMode, mode.as_str().into())
                .await
        {
            tracing::warn!(error = %e, "Failed to update charging mode capability");
        }

        Ok(())
    }
}
