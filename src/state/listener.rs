// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change listener slot.

use std::sync::Arc;

use parking_lot::RwLock;

/// Callback run after every observation or command.
///
/// It takes no arguments; the listener reads whatever it needs through the
/// switch accessors. It runs on the task that made the change (the polling
/// task or the caller of `set_on`) and must return quickly.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Holds the single listener of a switch. Empty slots notify nobody.
#[derive(Default)]
pub struct ListenerSlot {
    listener: RwLock<Option<Listener>>,
}

impl ListenerSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the listener.
    pub fn set(&self, listener: Listener) {
        *self.listener.write() = Some(listener);
    }

    /// Removes the listener.
    pub fn clear(&self) {
        self.listener.write().take();
    }

    /// Runs the listener, if any.
    pub fn notify(&self) {
        // cloned so the listener may replace itself
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl std::fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("set", &self.listener.read().is_some())
            .finish()
    }
}
