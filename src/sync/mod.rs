// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state synchronization.
//!
//! - [`SyncDevice`]: per-device orchestrator for the push, pull and
//!   user-change paths
//! - [`Reconciler`]: applies a normalized payload to the host platform
//! - [`EchoGuard`]: suppresses LED brightness echoes of in-flight writes

mod change;
mod echo_guard;
mod orchestrator;
mod reconciler;

pub use change::{CapabilityCommand, SettingsChange};
pub use echo_guard::{EchoGuard, EchoGuardHandle};
pub use orchestrator::SyncDevice;
pub use reconciler::{ApplyOutcome, ApplyReport, Reconciler};
