// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "http")]
use crate::protocol::HttpConfig;
use crate::store::store_name_for;

/// Configuration of a managed switch.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use shelly_switch::switch::SwitchConfig;
///
/// let config = SwitchConfig::new("192.168.1.40")
///     .with_name("heater")
///     .with_poll_interval(Duration::from_secs(5))
///     .with_store_directory("/var/lib/switch");
///
/// assert_eq!(config.name(), "heater");
/// assert_eq!(config.store_name(), "switch_192_168_1_40");
/// ```
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    name: String,
    address: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
    poll_interval: Duration,
    store_directory: Option<PathBuf>,
}

impl SwitchConfig {
    /// Default delay between two polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3300);
    /// Default timeout of a single device request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the device at `address`.
    ///
    /// The display name defaults to the address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            name: address.clone(),
            address,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            store_directory: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets HTTP basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the timeout of a single device request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between two polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Persists active time in a JSON file inside `directory`.
    #[must_use]
    pub fn with_store_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.store_directory = Some(directory.into());
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the delay between two polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the store directory, if any.
    #[must_use]
    pub fn store_directory(&self) -> Option<&Path> {
        self.store_directory.as_deref()
    }

    /// Returns the store name derived from the address.
    #[must_use]
    pub fn store_name(&self) -> String {
        store_name_for(&self.address)
    }

    /// Returns the HTTP configuration of the device.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let config = HttpConfig::new(self.address.clone()).with_timeout(self.timeout);
        match &self.credentials {
            Some((username, password)) => config.with_credentials(username, password),
            None => config,
        }
    }
}
