// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch state snapshot and change notification.
//!
//! - [`SwitchState`]: relay state, power and edge timestamps
//! - [`Transition`]: the edge between two observations
//! - [`ListenerSlot`]: the single callback run after each change

mod listener;
mod switch_state;

pub use listener::{Listener, ListenerSlot};
pub use switch_state::{SwitchState, Transition};
