// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability reconciliation.

use std::fmt;

use crate::capabilities::Capability;
use crate::device_kind::DeviceKind;
use crate::error::PlatformError;
use crate::host::{HostPlatform, MessageKey, PlatformValue, SettingKey};
use crate::payload::{SyncField, SyncPayload};

use super::EchoGuard;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The payload was blank; nothing was written and the warning was kept.
    Skipped,
    /// The payload was reconciled and the warning cleared.
    Reconciled(ApplyReport),
}

impl ApplyOutcome {
    /// Returns the report of a reconciled pass.
    #[must_use]
    pub fn report(&self) -> Option<&ApplyReport> {
        match self {
            Self::Skipped => None,
            Self::Reconciled(report) => Some(report),
        }
    }
}

/// Write counters of a reconciled pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Writes the host accepted.
    pub written: usize,
    /// Writes the host rejected.
    pub failed: usize,
    /// `true` if an LED brightness value was dropped by the echo guard.
    pub echo_suppressed: bool,
}

impl ApplyReport {
    fn record(&mut self, result: Result<(), PlatformError>) {
        match result {
            Ok(()) => self.written += 1,
            Err(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written, {} failed", self.written, self.failed)
    }
}

/// Applies normalized payloads to the host platform.
///
/// A field is written only when the device kind recognizes it, the host
/// declares the backing capability (for capability fields) and the field
/// is present. Writes are independent: one failing does not stop the
/// others. Every non-blank pass ends by clearing the warning banner.
///
/// # Examples
///
/// ```
/// use homesync_lib::device_kind::DeviceKind;
/// use homesync_lib::host::{MemoryPlatform, PlatformValue};
/// use homesync_lib::payload::SyncPayload;
/// use homesync_lib::sync::{EchoGuard, Reconciler};
/// use homesync_lib::{Capabilities, Capability};
///
/// # async fn example() {
/// let platform = MemoryPlatform::new(Capabilities::ev_wall());
/// let guard = EchoGuard::new();
/// let reconciler = Reconciler::new(&platform, DeviceKind::EvWall, &guard);
///
/// reconciler
///     .apply(&SyncPayload::new().with_charging_state("STOPPED"))
///     .await;
///
/// assert_eq!(
///     platform.capability_value(Capability::CableConnected),
///     Some(PlatformValue::Bool(false))
/// );
/// # }
/// ```
#[derive(Debug)]
pub struct Reconciler<'a, H> {
    platform: &'a H,
    kind: DeviceKind,
    echo_guard: &'a EchoGuard,
}

impl<'a, H: HostPlatform> Reconciler<'a, H> {
    /// Creates a reconciler writing to `platform`.
    #[must_use]
    pub fn new(platform: &'a H, kind: DeviceKind, echo_guard: &'a EchoGuard) -> Self {
        Self {
            platform,
            kind,
            echo_guard,
        }
    }

    /// Reconciles a payload into the host platform.
    pub async fn apply(&self, payload: &SyncPayload) -> ApplyOutcome {
        if payload.is_blank() {
            return ApplyOutcome::Skipped;
        }

        let mut report = ApplyReport::default();

        for field in payload.fields() {
            if !self.kind.recognizes(field) {
                tracing::trace!(kind = ?self.kind, field = %field, "Field not recognized");
                continue;
            }

            if let Some(capability) = DeviceKind::capability_gate(field)
                && !self.platform.has_capability(capability)
            {
                tracing::trace!(field = %field, capability = %capability, "Capability not declared");
                continue;
            }

            match field {
                SyncField::ConsumptionPower => {
                    if let Some(watts) = payload.consumption_power {
                        self.write_capability(&mut report, Capability::MeasurePower, watts.into())
                            .await;
                    }
                }
                SyncField::AlwaysOnPower => {
                    if let Some(watts) = payload.always_on_power {
                        self.write_capability(
                            &mut report,
                            Capability::MeasurePowerAlwaysOn,
                            watts.into(),
                        )
                        .await;
                    }
                }
                SyncField::ChargingState => {
                    if let Some(state) = &payload.charging_state {
                        self.write_capability(
                            &mut report,
                            Capability::CableConnected,
                            state.is_cable_connected().into(),
                        )
                        .await;
                    }
                }
                SyncField::ChargingMode => {
                    if let Some(mode) = &payload.charging_mode {
                        self.write_capability(
                            &mut report,
                            Capability::ChargingMode,
                            mode.as_str().into(),
                        )
                        .await;
                    }
                }
                SyncField::LedBrightness => {
                    if let Some(brightness) = payload.led_brightness {
                        if self.echo_guard.is_raised() {
                            tracing::debug!(
                                brightness = %brightness,
                                "Settings write in flight, ignoring LED brightness echo"
                            );
                            report.echo_suppressed = true;
                        } else {
                            let result = self
                                .platform
                                .set_setting(SettingKey::LedBrightness, f64::from(brightness).into())
                                .await;
                            report.record(best_effort(SettingKey::LedBrightness, result));
                        }
                    }
                }
                SyncField::Available => {
                    if let Some(available) = payload.available {
                        let result = if available {
                            self.platform.set_available().await
                        } else {
                            let reason = self.platform.translate(MessageKey::Unavailable);
                            self.platform.set_unavailable(&reason).await
                        };
                        report.record(best_effort("availability", result));
                    }
                }
            }
        }

        if let Err(e) = self.platform.unset_warning().await {
            tracing::warn!(error = %e, "Failed to clear warning");
        }

        tracing::debug!(kind = ?self.kind, report = %report, "Payload reconciled");

        ApplyOutcome::Reconciled(report)
    }

    async fn write_capability(
        &self,
        report: &mut ApplyReport,
        capability: Capability,
        value: PlatformValue,
    ) {
        let result = self.platform.set_capability_value(capability, value).await;
        report.record(best_effort(capability, result));
    }
}

/// Logs a failed best-effort write and passes the result through.
fn best_effort(
    target: impl fmt::Display,
    result: Result<(), PlatformError>,
) -> Result<(), PlatformError> {
    if let Err(e) = &result {
        tracing::warn!(target_name = %target, error = %e, "Best-effort write failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::host::{Availability, MemoryPlatform};
    use crate::types::{Brightness, ChargingMode};

    async fn apply(platform: &MemoryPlatform, kind: DeviceKind, payload: SyncPayload) -> ApplyOutcome {
        let guard = EchoGuard::new();
        Reconciler::new(platform, kind, &guard).apply(&payload).await
    }

    #[tokio::test]
    async fn blank_payload_is_a_noop() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());
        platform.set_warning("stale");

        let outcome = apply(&platform, DeviceKind::EvWall, SyncPayload::new()).await;

        assert_eq!(outcome, ApplyOutcome::Skipped);
        assert_eq!(platform.write_count(), 0);
        assert_eq!(platform.warning(), Some("stale".to_string()));
        assert_eq!(platform.warning_clear_count(), 0);
    }

    #[tokio::test]
    async fn power_fields_are_written() {
        let platform = MemoryPlatform::new(Capabilities::energy_meter());

        let outcome = apply(
            &platform,
            DeviceKind::EnergyMeter,
            SyncPayload::new()
                .with_consumption_power(1250.0)
                .with_always_on_power(35.0),
        )
        .await;

        assert_eq!(outcome.report().map(|r| r.written), Some(2));
        assert_eq!(
            platform.capability_value(Capability::MeasurePower),
            Some(PlatformValue::Number(1250.0))
        );
        assert_eq!(
            platform.capability_value(Capability::MeasurePowerAlwaysOn),
            Some(PlatformValue::Number(35.0))
        );
        assert_eq!(platform.warning_clear_count(), 1);
    }

    #[tokio::test]
    async fn absent_fields_keep_previous_values() {
        let platform = MemoryPlatform::new(Capabilities::energy_meter());
        apply(
            &platform,
            DeviceKind::EnergyMeter,
            SyncPayload::new().with_always_on_power(20.0),
        )
        .await;

        apply(
            &platform,
            DeviceKind::EnergyMeter,
            SyncPayload::new().with_consumption_power(800.0),
        )
        .await;

        assert_eq!(
            platform.capability_value(Capability::MeasurePowerAlwaysOn),
            Some(PlatformValue::Number(20.0))
        );
    }

    #[tokio::test]
    async fn charging_state_maps_to_cable_connected() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());

        apply(&platform, DeviceKind::EvWall, SyncPayload::new().with_charging_state("STOPPED")).await;
        assert_eq!(
            platform.capability_value(Capability::CableConnected),
            Some(PlatformValue::Bool(false))
        );

        apply(&platform, DeviceKind::EvWall, SyncPayload::new().with_charging_state("CHARGING")).await;
        assert_eq!(
            platform.capability_value(Capability::CableConnected),
            Some(PlatformValue::Bool(true))
        );
    }

    #[tokio::test]
    async fn charging_mode_is_lowercased() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());
        apply(
            &platform,
            DeviceKind::EvWall,
            SyncPayload::new().with_charging_mode(ChargingMode::from("ECO".to_string())),
        )
        .await;

        assert_eq!(
            platform.capability_value(Capability::ChargingMode),
            Some(PlatformValue::from("eco"))
        );
    }

    #[tokio::test]
    async fn undeclared_capability_is_skipped() {
        let platform = MemoryPlatform::new(
            Capabilities::builder()
                .with(Capability::MeasurePower)
                .build(),
        );

        let outcome = apply(
            &platform,
            DeviceKind::EvWall,
            SyncPayload::new()
                .with_consumption_power(10.0)
                .with_charging_state("CHARGING"),
        )
        .await;

        assert_eq!(
            outcome.report().copied(),
            Some(ApplyReport {
                written: 1,
                failed: 0,
                echo_suppressed: false
            })
        );
        assert_eq!(platform.capability_value(Capability::CableConnected), None);
    }

    #[tokio::test]
    async fn energy_meter_ignores_ev_fields() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());

        let outcome = apply(
            &platform,
            DeviceKind::EnergyMeter,
            SyncPayload::new()
                .with_charging_state("CHARGING")
                .with_led_brightness(Brightness::clamped(30))
                .with_available(false),
        )
        .await;

        assert_eq!(outcome.report().map(|r| r.written), Some(0));
        assert_eq!(platform.setting(SettingKey::LedBrightness), None);
        assert!(platform.availability().is_available());
        // Still a non-blank pass
        assert_eq!(platform.warning_clear_count(), 1);
    }

    #[tokio::test]
    async fn led_brightness_goes_to_settings() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());
        apply(
            &platform,
            DeviceKind::EvWall,
            SyncPayload::new().with_led_brightness(Brightness::clamped(42)),
        )
        .await;

        assert_eq!(
            platform.setting(SettingKey::LedBrightness),
            Some(PlatformValue::Number(42.0))
        );
    }

    #[tokio::test]
    async fn raised_guard_suppresses_led_brightness() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());
        let guard = EchoGuard::new();
        let reconciler = Reconciler::new(&platform, DeviceKind::EvWall, &guard);

        let outcome = {
            let _raised = guard.raise();
            reconciler
                .apply(
                    &SyncPayload::new()
                        .with_led_brightness(Brightness::clamped(42))
                        .with_consumption_power(5.0),
                )
                .await
        };

        let report = outcome.report().copied().unwrap();
        assert!(report.echo_suppressed);
        assert_eq!(report.written, 1);
        assert_eq!(platform.setting(SettingKey::LedBrightness), None);
        assert_eq!(platform.warning_clear_count(), 1);
    }

    #[tokio::test]
    async fn availability_transitions() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());

        apply(&platform, DeviceKind::EvWall, SyncPayload::new().with_available(false)).await;
        assert_eq!(
            platform.availability(),
            Availability::Unavailable("Device is unavailable".to_string())
        );

        apply(&platform, DeviceKind::EvWall, SyncPayload::new().with_available(true)).await;
        assert!(platform.availability().is_available());
    }

    #[tokio::test]
    async fn failed_write_does_not_stop_the_pass() {
        let platform = MemoryPlatform::new(Capabilities::ev_wall());
        platform.fail_capability_writes(Capability::MeasurePower);
        platform.set_warning("stale");

        let outcome = apply(
            &platform,
            DeviceKind::EvWall,
            SyncPayload::new()
                .with_consumption_power(100.0)
                .with_charging_state("CHARGING"),
        )
        .await;

        assert_eq!(
            outcome.report().copied(),
            Some(ApplyReport {
                written: 1,
                failed: 1,
                echo_suppressed: false
            })
        );
        assert_eq!(
            platform.capability_value(Capability::CableConnected),
            Some(PlatformValue::Bool(true))
        );
        assert_eq!(platform.warning(), None);
    }

    #[test]
    fn report_display() {
        let report = ApplyReport {
            written: 3,
            failed: 1,
            echo_suppressed: false,
        };
        assert_eq!(report.to_string(), "3 written, 1 failed");
    }
}
