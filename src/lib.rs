// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `HomeSync` Lib - keeps smart-home device state in sync with a cloud
//! energy-monitoring service.
//!
//! Device state arrives through three paths and ends up in the same host
//! platform capability store:
//!
//! - **Push**: MQTT telemetry and lifecycle messages
//! - **Pull**: remote API queries for state the push stream lacks
//! - **Local**: settings and capability changes made by the user
//!
//! Every inbound payload is normalized into a [`SyncPayload`](payload::SyncPayload)
//! and reconciled field by field against the capabilities the device
//! declares. A per-device echo guard keeps the echo of a settings write
//! from overwriting the value the user just chose.
//!
//! # Supported Devices
//!
//! - Energy meter: consumption and always-on power
//! - EV wall charger connector: power, cable state, charging mode, status
//!   LED brightness and availability
//!
//! # Quick Start
//!
//! ```no_run
//! use homesync_lib::config::DeviceConfig;
//! use homesync_lib::host::MemoryPlatform;
//! use homesync_lib::protocol::{MqttTransport, MqttTransportConfig};
//! use homesync_lib::remote::ApiConfig;
//! use homesync_lib::sync::SyncDevice;
//! use homesync_lib::Capabilities;
//!
//! #[tokio::main]
//! async fn main() -> homesync_lib::Result<()> {
//!     let transport = MqttTransport::connect(
//!         MqttTransportConfig::new("mqtt.example.com").with_credentials("user", "secret"),
//!     )
//!     .await?;
//!
//!     let api = ApiConfig::new("https://api.example.com/dev/v3")
//!         .with_token("secret")
//!         .into_client()?;
//!
//!     let device = SyncDevice::new(
//!         DeviceConfig::ev_wall("1234", "5010012345", 1).with_led_id("led-7"),
//!         MemoryPlatform::new(Capabilities::ev_wall()),
//!         api,
//!     )?;
//!
//!     // Initial pull, then follow the push stream
//!     device.sync().await?;
//!     let inbox = transport.subscribe(&device.subscription_filter()).await?;
//!     device.run(inbox).await;
//!
//!     Ok(())
//! }
//! ```

mod capabilities;
pub mod config;
pub mod device_kind;
pub mod error;
pub mod host;
pub mod payload;
pub mod protocol;
pub mod remote;
pub mod sync;
pub mod types;

pub use capabilities::{Capabilities, CapabilitiesBuilder, Capability};
pub use config::{DeviceConfig, DeviceIdentity};
pub use device_kind::{DeviceKind, SubscriptionTopic};
pub use error::{
    ApiError, ConfigError, DeviceError, Error, ParseError, PlatformError, ProtocolError, Result,
    ValueError,
};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttTransport, MqttTransportConfig};
pub use protocol::{TopicKind, TopicRouter};
#[cfg(feature = "http")]
pub use remote::{ApiConfig, HttpRemoteApi};
pub use remote::RemoteApi;
pub use sync::{ApplyOutcome, SyncDevice};
pub use types::{Brightness, ChargingMode, ChargingState};
