// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `HomeSync` library.
//!
//! The hierarchy separates the failures a caller must see (remote API
//! errors, unsupported operations, invalid configuration) from the ones
//! the reconciliation pass only logs (host platform write failures,
//! undecodable payloads).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred on the MQTT transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error returned by the remote device-management API.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Error occurred while decoding a payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device cannot perform the requested operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The host platform rejected a write.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The device configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A charging mode string was empty.
    #[error("charging mode must not be blank")]
    BlankChargingMode,
}

/// Errors related to the MQTT transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors returned by the remote device-management API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase.
        reason: String,
    },

    /// The access token was rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid base URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to decoding inbound payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected payload format.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to device operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// LED brightness was requested but the device has no LED id.
    ///
    /// The message is localized by the host platform.
    #[error("{message}")]
    LedNotSupported {
        /// User-facing message.
        message: String,
    },

    /// A charging command was issued but the station is not configured.
    #[error("charging station serial number or position is not configured")]
    StationNotConfigured,

    /// Device does not declare the requested capability.
    #[error("device does not support {capability}")]
    UnsupportedCapability {
        /// The capability identifier.
        capability: String,
    },
}

/// Errors reported by the host platform when a write fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Writing a capability, setting or availability failed.
    #[error("failed to write {target}: {reason}")]
    WriteFailed {
        /// What was being written (capability id, setting key, ...).
        target: String,
        /// Why the write failed.
        reason: String,
    },
}

/// Errors related to device configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON.
    #[error("JSON config error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field required by the device kind is missing.
    #[error("missing configuration field: {0}")]
    MissingField(&'static str),

    /// A field has an invalid value.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
