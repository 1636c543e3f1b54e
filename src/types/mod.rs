// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for device state.
//!
//! # Types
//!
//! - [`Brightness`] - LED brightness (0-100%)
//! - [`ChargingState`] - Connector state (`STOPPED` or anything else)
//! - [`ChargingMode`] - Connector charging mode, normalized to lower case

mod brightness;
mod charging;

pub use brightness::Brightness;
pub use charging::{ChargingMode, ChargingState};
