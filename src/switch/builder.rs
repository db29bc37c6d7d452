// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch builder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::accumulator::DailyAccumulator;
use crate::adapter::SwitchAdapter;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::state::ListenerSlot;
use crate::store::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::switch::{Switch, SwitchConfig};

#[cfg(feature = "http")]
use crate::adapter::ShellyAdapter;
#[cfg(feature = "http")]
use crate::protocol::HttpTransport;

/// Builder for a [`Switch`].
///
/// Created by [`Switch::http`] or from a [`SwitchConfig`]. Active time goes to
/// the store given with [`with_store`](Self::with_store), else to a JSON file
/// in the directory given with
/// [`with_store_directory`](Self::with_store_directory), else to memory only.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use shelly_switch::Switch;
///
/// # async fn example() -> shelly_switch::Result<()> {
/// let switch = Switch::http("192.168.1.40")
///     .with_name("boiler")
///     .with_credentials("admin", "password")
///     .with_poll_interval(Duration::from_secs(5))
///     .with_store_directory("/var/lib/switch")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SwitchBuilder {
    config: SwitchConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Arc<dyn Clock>,
    listener: ListenerSlot,
}

impl SwitchBuilder {
    /// Creates a builder from a configuration.
    #[must_use]
    pub fn new(config: SwitchConfig) -> Self {
        Self {
            config,
            store: None,
            clock: Arc::new(SystemClock),
            listener: ListenerSlot::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_name(name);
        self
    }

    /// Sets HTTP basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config = self.config.with_credentials(username, password);
        self
    }

    /// Sets the timeout of a single device request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Sets the delay between two polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_poll_interval(interval);
        self
    }

    /// Persists active time in a JSON file inside `directory`.
    #[must_use]
    pub fn with_store_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_store_directory(directory);
        self
    }

    /// Persists active time in `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the change listener, already notified by the initial read.
    #[must_use]
    pub fn with_listener<F>(self, listener: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listener.set(Arc::new(listener));
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Builds the switch, detecting the firmware dialect.
    ///
    /// Probes the device once, then reads its initial state.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The device is unreachable
    /// - The device speaks neither dialect (the initial read fails)
    /// - The store cannot be opened
    #[cfg(feature = "http")]
    pub async fn build(self) -> Result<Switch<ShellyAdapter<HttpTransport>>> {
        let http = self.config.http_config();
        let adapter = ShellyAdapter::detect(|| http.clone().into_transport()).await?;
        self.build_with_adapter(adapter).await
    }

    /// Builds the switch around an existing adapter, skipping detection.
    ///
    /// Still reads the initial state of the device.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be opened or the initial read fails.
    pub async fn build_with_adapter<A: SwitchAdapter>(self, adapter: A) -> Result<Switch<A>> {
        let store = self.open_store()?;
        let accumulator = DailyAccumulator::new(store, Arc::clone(&self.clock));
        let switch = Switch::new(&self.config, adapter, accumulator, self.clock, self.listener);

        switch.sync().await?;

        tracing::info!(
            switch = %switch.name(),
            address = %self.config.address(),
            generation = %switch.generation(),
            is_on = switch.is_on(),
            "Switch ready"
        );
        Ok(switch)
    }

    fn open_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        if let Some(store) = &self.store {
            return Ok(Arc::clone(store));
        }
        match self.config.store_directory() {
            Some(directory) => {
                let store = JsonFileStore::open_with_clock(
                    directory,
                    &self.config.store_name(),
                    Arc::clone(&self.clock),
                )?;
                Ok(Arc::new(store))
            }
            None => {
                tracing::warn!(
                    switch = %self.config.name(),
                    "No store directory configured, active time is kept in memory only"
                );
                Ok(Arc::new(MemoryStore::with_clock(Arc::clone(&self.clock))))
            }
        }
    }
}

impl std::fmt::Debug for SwitchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchBuilder")
            .field("config", &self.config)
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}
