// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response payloads of the two device dialects.
//!
//! - [`LegacyStatus`]: body of `GET /status` on first generation firmware
//! - [`SwitchStatus`]: body of `GET /rpc/Switch.GetStatus?id=0` on RPC firmware

mod legacy;
mod rpc;

pub use legacy::{LegacyMeter, LegacyRelay, LegacyStatus};
pub use rpc::SwitchStatus;

/// Rounds a power reading to whole watts.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn whole_watts(watts: f64) -> i64 {
    if watts.is_finite() {
        watts.round() as i64
    } else {
        0
    }
}
