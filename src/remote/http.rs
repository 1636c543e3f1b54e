// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of the remote API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::remote::RemoteApi;
use crate::types::{Brightness, ChargingMode};

// ============================================================================
// ApiConfig - Configuration of the remote API client
// ============================================================================

/// Configuration of the remote API client.
///
/// # Examples
///
/// ```
/// use homesync_lib::remote::ApiConfig;
/// use std::time::Duration;
///
/// let config = ApiConfig::new("https://api.example.com/dev/v3/")
///     .with_token("secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://api.example.com/dev/v3");
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    base_url: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default = "default_timeout", with = "duration_secs")]
    timeout: Duration,
}

impl ApiConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the bearer token, if set.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an `HttpRemoteApi` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not an HTTP(S) URL or the HTTP
    /// client cannot be created.
    pub fn into_client(self) -> Result<HttpRemoteApi, ApiError> {
        let base_url = self.base_url().to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidAddress(format!(
                "'{base_url}' is not an http(s) URL"
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(HttpRemoteApi {
            base_url,
            client,
            token: self.token,
        })
    }
}

fn default_timeout() -> Duration {
    ApiConfig::DEFAULT_TIMEOUT
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

// ============================================================================
// HttpRemoteApi - Remote API over HTTP
// ============================================================================

/// Remote API client over HTTP.
///
/// Every request carries the bearer token when one is configured. Path
/// segments taken from device identifiers are percent-encoded.
///
/// # Examples
///
/// ```no_run
/// use homesync_lib::remote::{ApiConfig, RemoteApi};
///
/// # async fn example() -> homesync_lib::Result<()> {
/// let api = ApiConfig::new("https://api.example.com/dev/v3")
///     .with_token("secret")
///     .into_client()?;
///
/// let brightness = api.get_led_brightness("1234", "led-7").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpRemoteApi {
    base_url: String,
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ValueBody {
    value: f64,
}

#[derive(Debug, Serialize)]
struct ModeBody<'a> {
    mode: &'a str,
}

impl HttpRemoteApi {
    /// Returns the base URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn led_brightness_url(&self, location_id: &str, led_id: &str) -> String {
        format!(
            "{}/servicelocation/{}/leds/{}/brightness",
            self.base_url,
            urlencoding::encode(location_id),
            urlencoding::encode(led_id)
        )
    }

    fn charging_mode_url(&self, station_serial: &str, position: u32) -> String {
        format!(
            "{}/chargingstations/{}/connectors/{position}/mode",
            self.base_url,
            urlencoding::encode(station_serial)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(ApiError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthenticationFailed);
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response)
    }
}

impl RemoteApi for HttpRemoteApi {
    async fn get_led_brightness(&self, location_id: &str, led_id: &str) -> Result<f64, ApiError> {
        let url = self.led_brightness_url(location_id, led_id);

        tracing::debug!(url = %url, "Querying LED brightness");

        let body = self
            .send(self.client.get(&url))
            .await?
            .text()
            .await
            .map_err(ApiError::Http)?;

        tracing::debug!(body = %body, "Received LED brightness");

        parse_brightness(&body)
    }

    async fn set_led_brightness(
        &self,
        location_id: &str,
        led_id: &str,
        brightness: Brightness,
    ) -> Result<(), ApiError> {
        let url = self.led_brightness_url(location_id, led_id);

        tracing::debug!(url = %url, brightness = %brightness, "Setting LED brightness");

        self.send(self.client.put(&url).json(&ValueBody {
            value: f64::from(brightness),
        }))
        .await?;
        Ok(())
    }

    async fn set_charging_mode(
        &self,
        station_serial: &str,
        position: u32,
        mode: &ChargingMode,
    ) -> Result<(), ApiError> {
        let url = self.charging_mode_url(station_serial, position);

        tracing::debug!(url = %url, mode = %mode, "Setting charging mode");

        self.send(self.client.put(&url).json(&ModeBody {
            mode: mode.as_str(),
        }))
        .await?;
        Ok(())
    }
}

/// Parses a brightness body: either a bare number or `{"value": n}`.
fn parse_brightness(body: &str) -> Result<f64, ApiError> {
    let value: serde_json::Value = serde_json::from_str(body.trim())
        .map_err(|e| ApiError::InvalidResponse(format!("brightness is not JSON: {e}")))?;

    match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::Object(map) => map.get("value").and_then(serde_json::Value::as_f64),
        _ => None,
    }
    .ok_or_else(|| ApiError::InvalidResponse(format!("expected a number, got {value}")))
}
