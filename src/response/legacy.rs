// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status payload of first generation firmware.

use serde::Deserialize;

use crate::error::ParseError;

/// Response of `GET /status`.
///
/// Only the fields needed to track the relay are kept; the device reports
/// many more (wifi, cloud, update, ...), which are ignored.
///
/// # Examples
///
/// ```
/// use shelly_switch::response::LegacyStatus;
///
/// let json = r#"{"relays": [{"ison": true}], "meters": [{"power": 41.7}]}"#;
/// let status: LegacyStatus = serde_json::from_str(json).unwrap();
/// assert!(status.is_on().unwrap());
/// assert_eq!(status.power(), 42);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyStatus {
    #[serde(default)]
    relays: Vec<LegacyRelay>,
    #[serde(default)]
    meters: Vec<LegacyMeter>,
}

/// One relay entry of the legacy status.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRelay {
    /// Whether the relay is closed.
    pub ison: bool,
}

/// One power meter entry of the legacy status.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyMeter {
    /// Instantaneous power in watts.
    #[serde(default)]
    pub power: f64,
}

impl LegacyStatus {
    /// Returns the state of relay 0.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the device reports no relay.
    pub fn is_on(&self) -> Result<bool, ParseError> {
        self.relays
            .first()
            .map(|relay| relay.ison)
            .ok_or_else(|| ParseError::MissingField("relays[0].ison".to_string()))
    }

    /// Returns the power of meter 0 in whole watts, 0 for devices without meter.
    #[must_use]
    pub fn power(&self) -> i64 {
        self.meters
            .first()
            .map_or(0, |meter| super::whole_watts(meter.power))
    }
}
