// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Echo suppression for settings writes.
//!
//! When the user changes a setting, the remote write is followed by a
//! lifecycle update echoing the new value. Reconciling that echo while the
//! write is still in flight would write the setting back into the host.
//! The guard is raised for the duration of the write and suppresses
//! `led_brightness` reconciliation.

use std::sync::atomic::{AtomicBool, Ordering};

/// Flag suppressing LED brightness reconciliation while a settings write
/// is in flight.
#[derive(Debug, Default)]
pub struct EchoGuard {
    raised: AtomicBool,
}

impl EchoGuard {
    /// Creates a lowered guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the guard until the returned handle is dropped.
    ///
    /// The handle lowers the flag on every exit path, including early
    /// returns through `?` and unwinding.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::sync::EchoGuard;
    ///
    /// let guard = EchoGuard::new();
    /// {
    ///     let _raised = guard.raise();
    ///     assert!(guard.is_raised());
    /// }
    /// assert!(!guard.is_raised());
    /// ```
    #[must_use = "the guard is lowered as soon as the handle is dropped"]
    pub fn raise(&self) -> EchoGuardHandle<'_> {
        self.raised.store(true, Ordering::SeqCst);
        EchoGuardHandle { guard: self }
    }

    /// Returns `true` while a settings write is in flight.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Handle returned by [`EchoGuard::raise`].
#[derive(Debug)]
pub struct EchoGuardHandle<'a> {
    guard: &'a EchoGuard,
}

impl Drop for EchoGuardHandle<'_> {
    fn drop(&mut self) {
        self.guard.raised.store(false, Ordering::SeqCst);
    }
}
