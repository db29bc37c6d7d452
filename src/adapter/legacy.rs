// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! First generation REST dialect.

use crate::adapter::{Generation, Reading, SwitchAdapter, exchange, probe};
use crate::error::{DeviceError, Result};
use crate::protocol::Transport;
use crate::response::LegacyStatus;

const STATUS_URI: &str = "/status";

/// Driver for first generation firmware (Shelly 1, Shelly Plug S, ...).
#[derive(Debug)]
pub struct LegacyAdapter<T: Transport> {
    transport: T,
}

impl<T: Transport> LegacyAdapter<T> {
    /// Creates an adapter over the given transport. Does not probe.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn switch_uri(on: bool) -> String {
        format!("/relay/0?turn={}", if on { "on" } else { "off" })
    }
}

impl<T: Transport> SwitchAdapter for LegacyAdapter<T> {
    fn generation(&self) -> Generation {
        Generation::Legacy
    }

    async fn supports(&self) -> Result<bool> {
        probe(&self.transport, STATUS_URI).await
    }

    async fn query(&self) -> Result<Reading> {
        exchange(&self.transport, STATUS_URI, |response| {
            if !response.is_success() {
                return Err(DeviceError::UnexpectedStatus {
                    uri: STATUS_URI.to_string(),
                    status: response.status(),
                }
                .into());
            }
            let status: LegacyStatus = response.parse()?;
            Ok(Reading {
                on: status.is_on()?,
                power: status.power(),
            })
        })
        .await
    }

    async fn switch(&self, on: bool) -> Result<()> {
        let uri = Self::switch_uri(on);
        exchange(&self.transport, &uri, |response| {
            if response.is_success() {
                Ok(())
            } else {
                Err(DeviceError::CommandRejected {
                    uri: uri.clone(),
                    status: response.status(),
                    body: response.body().to_string(),
                }
                .into())
            }
        })
        .await
    }

    fn close(&self) {
        self.transport.close();
    }
}
