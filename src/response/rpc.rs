// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Switch.GetStatus` payload of RPC firmware.

use serde::Deserialize;

/// Response of `GET /rpc/Switch.GetStatus?id=0`.
///
/// # Examples
///
/// ```
/// use shelly_switch::response::SwitchStatus;
///
/// let json = r#"{"id": 0, "source": "init", "output": true, "temperature": {"tC": 41.2}}"#;
/// let status: SwitchStatus = serde_json::from_str(json).unwrap();
/// assert!(status.output);
/// assert_eq!(status.power(), 0);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchStatus {
    /// Switch component id.
    #[serde(default)]
    pub id: u8,
    /// Whether the output is on.
    pub output: bool,
    /// Active power in watts, only reported by metering models.
    #[serde(default)]
    pub apower: Option<f64>,
}

impl SwitchStatus {
    /// Returns the active power in whole watts, 0 if the model does not meter.
    #[must_use]
    pub fn power(&self) -> i64 {
        self.apower.map_or(0, super::whole_watts)
    }
}
