// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RPC dialect of second generation firmware.

use crate::adapter::{Generation, Reading, SwitchAdapter, exchange, probe};
use crate::error::{DeviceError, ParseError, Result};
use crate::protocol::Transport;
use crate::response::SwitchStatus;

const STATUS_URI: &str = "/rpc/Switch.GetStatus?id=0";

/// Driver for RPC firmware (Shelly Plus 1, Shelly Plus Plug S, ...).
#[derive(Debug)]
pub struct RpcAdapter<T: Transport> {
    transport: T,
}

impl<T: Transport> RpcAdapter<T> {
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
        format!("/rpc/Switch.Set?id=0&on={on}")
    }
}

impl<T: Transport> SwitchAdapter for RpcAdapter<T> {
    fn generation(&self) -> Generation {
        Generation::Rpc
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
            let status: SwitchStatus = response.parse()?;
            if status.id != 0 {
                return Err(ParseError::UnexpectedFormat(format!(
                    "status of switch {} instead of switch 0",
                    status.id
                ))
                .into());
            }
            Ok(Reading {
                on: status.output,
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
