// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay state tracking.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Edge observed between two relay states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No edge.
    None,
    /// Off to on.
    Activated,
    /// On to off.
    Deactivated,
}

impl Transition {
    /// Returns the edge from `was_on` to `is_on`.
    #[must_use]
    pub fn between(was_on: bool, is_on: bool) -> Self {
        match (was_on, is_on) {
            (false, true) => Self::Activated,
            (true, false) => Self::Deactivated,
            _ => Self::None,
        }
    }
}

/// Last known state of a relay switch.
///
/// The activation and deactivation times start at construction time and only
/// move when an edge is observed or commanded.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeDelta};
/// use shelly_switch::state::{SwitchState, Transition};
///
/// let start = Local::now();
/// let mut state = SwitchState::new(start);
///
/// let later = start + TimeDelta::seconds(5);
/// assert_eq!(state.apply_observation(true, 12, later), Transition::Activated);
/// assert!(state.is_on);
/// assert_eq!(state.last_activation_time, later);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchState {
    /// Whether the relay is on.
    pub is_on: bool,
    /// Last observed power draw in watts.
    pub power: i64,
    /// When the relay was last seen or commanded going on.
    pub last_activation_time: DateTime<Local>,
    /// When the relay was last seen or commanded going off.
    pub last_deactivation_time: DateTime<Local>,
}

impl SwitchState {
    /// Creates an off state with both timestamps set to `now`.
    #[must_use]
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            is_on: false,
            power: 0,
            last_activation_time: now,
            last_deactivation_time: now,
        }
    }

    /// Moves the edge timestamps for a change to `is_on` happening at `now`.
    ///
    /// Does not touch `is_on` itself.
    pub fn record_transition(&mut self, is_on: bool, now: DateTime<Local>) -> Transition {
        let transition = Transition::between(self.is_on, is_on);
        match transition {
            Transition::Activated => self.last_activation_time = now,
            Transition::Deactivated => self.last_deactivation_time = now,
            Transition::None => {}
        }
        transition
    }

    /// Applies an observation of the device taken at `now`.
    pub fn apply_observation(&mut self, is_on: bool, power: i64, now: DateTime<Local>) -> Transition {
        let transition = self.record_transition(is_on, now);
        self.is_on = is_on;
        self.power = power;
        transition
    }
}
