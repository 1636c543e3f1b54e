// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote device-management API.
//!
//! The cloud API is the source of truth for settings the push stream does
//! not carry (the LED brightness) and the target of user-initiated
//! commands (LED brightness, charging mode).
//!
//! - [`RemoteApi`]: the operations a synchronized device needs
//! - [`HttpRemoteApi`]: implementation over HTTPS with bearer auth

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{ApiConfig, HttpRemoteApi};

use std::sync::Arc;

use crate::error::ApiError;
use crate::types::{Brightness, ChargingMode};

/// Operations of the remote device-management API.
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
    /// Queries the current brightness of a status LED.
    ///
    /// The raw number is returned as-is; clamping happens during
    /// normalization.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the body is not a number.
    async fn get_led_brightness(&self, location_id: &str, led_id: &str) -> Result<f64, ApiError>;

    /// Sets the brightness of a status LED.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn set_led_brightness(
        &self,
        location_id: &str,
        led_id: &str,
        brightness: Brightness,
    ) -> Result<(), ApiError>;

    /// Sets the charging mode of a charging station connector.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    async fn set_charging_mode(
        &self,
        station_serial: &str,
        position: u32,
        mode: &ChargingMode,
    ) -> Result<(), ApiError>;
}

impl<T: RemoteApi> RemoteApi for Arc<T> {
    async fn get_led_brightness(&self, location_id: &str, led_id: &str) -> Result<f64, ApiError> {
        self.as_ref().get_led_brightness(location_id, led_id).await
    }

    async fn set_led_brightness(
        &self,
        location_id: &str,
        led_id: &str,
        brightness: Brightness,
    ) -> Result<(), ApiError> {
        self.as_ref()
            .set_led_brightness(location_id, led_id, brightness)
            .await
    }

    async fn set_charging_mode(
        &self,
        station_serial: &str,
        position: u32,
        mode: &ChargingMode,
    ) -> Result<(), ApiError> {
        self.as_ref()
            .set_charging_mode(station_serial, position, mode)
            .await
    }
}
