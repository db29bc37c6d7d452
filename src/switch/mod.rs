// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device controller of a relay switch.
//!
//! A [`Switch`] owns the adapter picked at construction, the last known
//! relay state and the daily active-time accumulator of its device.
//!
//! # Observation versus command
//!
//! [`Switch::sync`] reads the device and moves the activation and
//! deactivation timestamps when it sees an edge, but it never writes active
//! time. Only [`Switch::set_on`] with `false` persists the seconds elapsed
//! since the last activation. A relay turned off at the device itself
//! therefore shows a new deactivation time without adding to the day total.
//!
//! # Concurrency
//!
//! `sync` and `set_on` run one at a time: both hold the adapter lock for the
//! whole operation, so the polling task and a caller of `set_on` cannot
//! interleave their reads and writes of the state. Accessors read a snapshot
//! and never wait on the network.
//!
//! # Examples
//!
//! ```no_run
//! use shelly_switch::Switch;
//!
//! # async fn example() -> shelly_switch::Result<()> {
//! let switch = Switch::http("192.168.1.40")
//!     .with_name("heater")
//!     .with_store_directory("/var/lib/switch")
//!     .build()
//!     .await?;
//!
//! switch.set_listener(|| println!("changed"));
//! switch.start();
//!
//! switch.set_on(true).await?;
//! println!("{} is on: {}", switch.name(), switch.is_on());
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod poller;

pub use builder::SwitchBuilder;
pub use config::SwitchConfig;

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::RwLock;

use crate::accumulator::DailyAccumulator;
use crate::adapter::{Generation, SwitchAdapter};
use crate::clock::Clock;
use crate::error::Result;
use crate::state::{ListenerSlot, SwitchState, Transition};

use poller::Poller;

#[cfg(feature = "http")]
use crate::adapter::ShellyAdapter;
#[cfg(feature = "http")]
use crate::protocol::HttpTransport;

/// A switch reached over HTTP with an auto-detected dialect.
#[cfg(feature = "http")]
pub type HttpSwitch = Switch<ShellyAdapter<HttpTransport>>;

/// Handle on a managed relay switch.
///
/// Cloning is cheap; all clones control the same device.
pub struct Switch<A: SwitchAdapter> {
    inner: Arc<SwitchInner<A>>,
}

pub(crate) struct SwitchInner<A: SwitchAdapter> {
    name: String,
    generation: Generation,
    adapter: tokio::sync::Mutex<A>,
    state: RwLock<SwitchState>,
    accumulator: DailyAccumulator,
    clock: Arc<dyn Clock>,
    listener: ListenerSlot,
    poller: Poller,
}

#[cfg(feature = "http")]
impl Switch<ShellyAdapter<HttpTransport>> {
    /// Creates a builder for the device at `address`.
    ///
    /// See [`SwitchBuilder::build`].
    #[must_use]
    pub fn http(address: impl Into<String>) -> SwitchBuilder {
        SwitchBuilder::new(SwitchConfig::new(address))
    }
}

impl<A: SwitchAdapter> Switch<A> {
    pub(crate) fn new(
        config: &SwitchConfig,
        adapter: A,
        accumulator: DailyAccumulator,
        clock: Arc<dyn Clock>,
        listener: ListenerSlot,
    ) -> Self {
        let now = clock.now();
        Self {
            inner: Arc::new(SwitchInner {
                name: config.name().to_string(),
                generation: adapter.generation(),
                adapter: tokio::sync::Mutex::new(adapter),
                state: RwLock::new(SwitchState::new(now)),
                accumulator,
                clock,
                listener,
                poller: Poller::new(config.poll_interval()),
            }),
        }
    }

    /// Reads the device and updates the known state.
    ///
    /// The listener is notified after every successful read.
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be read; the known state is left
    /// untouched.
    pub async fn sync(&self) -> Result<()> {
        self.inner.sync().await
    }

    /// Switches the relay.
    ///
    /// A command is only sent when `on` differs from the known state. Turning
    /// the relay off adds the seconds since the last activation to today's
    /// active time. The device is read again afterwards and the listener is
    /// notified.
    ///
    /// # Errors
    ///
    /// Returns error if the command fails, leaving the known state
    /// untouched, or if the read after a command fails.
    pub async fn set_on(&self, on: bool) -> Result<()> {
        self.inner.set_on(on).await
    }

    /// Starts the background polling task.
    ///
    /// Does nothing if it is already running. Must be called from within a
    /// tokio runtime.
    pub fn start(&self)
    where
        A: 'static,
    {
        tracing::info!(switch = %self.inner.name, interval = ?self.inner.poller.interval(), "Start polling");
        self.inner.poller.start(Arc::downgrade(&self.inner));
    }

    /// Asks the polling task to exit. A sync in progress is not interrupted.
    pub fn stop(&self) {
        tracing::info!(switch = %self.inner.name, "Stop polling");
        self.inner.poller.stop();
    }

    /// Returns true while the polling task runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.poller.is_running()
    }

    /// Stops polling and releases the device transport.
    pub async fn close(&self) {
        self.stop();
        self.inner.adapter.lock().await.close();
    }

    /// Replaces the change listener.
    pub fn set_listener<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.listener.set(Arc::new(listener));
    }

    /// Removes the change listener.
    pub fn clear_listener(&self) {
        self.inner.listener.clear();
    }

    // ========== Accessors ==========

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the dialect the device speaks.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.inner.generation
    }

    /// Returns a snapshot of the known state.
    #[must_use]
    pub fn state(&self) -> SwitchState {
        self.inner.state.read().clone()
    }

    /// Returns whether the relay is on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.inner.state.read().is_on
    }

    /// Returns the last observed power draw in watts.
    #[must_use]
    pub fn power(&self) -> i64 {
        self.inner.state.read().power
    }

    /// Returns when the relay last went on.
    #[must_use]
    pub fn last_activation_time(&self) -> DateTime<Local> {
        self.inner.state.read().last_activation_time
    }

    /// Returns when the relay last went off.
    #[must_use]
    pub fn last_deactivation_time(&self) -> DateTime<Local> {
        self.inner.state.read().last_deactivation_time
    }

    /// Returns the active hours of today.
    #[must_use]
    pub fn hours_today(&self) -> f64 {
        self.inner.accumulator.hours_today()
    }

    /// Returns the active hours since January 1st.
    #[must_use]
    pub fn hours_current_year(&self) -> f64 {
        self.inner.accumulator.hours_current_year()
    }

    /// Returns the active hours extrapolated to a full year.
    #[must_use]
    pub fn estimated_year_hours(&self) -> f64 {
        self.inner.accumulator.estimated_year_hours()
    }

    /// Returns the active seconds of a day of the current year, `None` if
    /// nothing was recorded.
    #[must_use]
    pub fn active_seconds_for_day(&self, day_of_year: u32) -> Option<f64> {
        self.inner.accumulator.active_seconds_for_day(day_of_year)
    }

    /// Returns the accumulator of this switch.
    #[must_use]
    pub fn accumulator(&self) -> &DailyAccumulator {
        &self.inner.accumulator
    }
}

impl<A: SwitchAdapter> Clone for Switch<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: SwitchAdapter> std::fmt::Debug for Switch<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switch")
            .field("name", &self.inner.name)
            .field("generation", &self.inner.generation)
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

impl<A: SwitchAdapter> SwitchInner<A> {
    async fn sync(&self) -> Result<()> {
        let adapter = self.adapter.lock().await;
        self.observe(&adapter).await
    }

    async fn set_on(&self, on: bool) -> Result<()> {
        let adapter = self.adapter.lock().await;
        let was_on = self.state.read().is_on;

        if on != was_on {
            adapter.switch(on).await?;
            let now = self.clock.now();
            let activated_at = {
                let mut state = self.state.write();
                let activated_at = state.last_activation_time;
                state.record_transition(on, now);
                state.is_on = on;
                activated_at
            };

            if on {
                tracing::info!(switch = %self.name, "Activated");
            } else {
                self.record_active_time(activated_at, now);
            }
        }

        let result = self.observe(&adapter).await;
        if result.is_err() && on != was_on {
            // the command went through even though the read back failed
            self.listener.notify();
        }
        result
    }

    /// Queries the device and applies the reading.
    async fn observe(&self, adapter: &A) -> Result<()> {
        let reading = adapter.query().await?;
        let now = self.clock.now();
        let transition = self
            .state
            .write()
            .apply_observation(reading.on, reading.power, now);

        match transition {
            Transition::Activated => {
                tracing::info!(switch = %self.name, "Observed activation");
            }
            Transition::Deactivated => {
                tracing::info!(switch = %self.name, "Observed deactivation");
            }
            Transition::None => {}
        }

        self.listener.notify();
        Ok(())
    }

    fn record_active_time(&self, activated_at: DateTime<Local>, now: DateTime<Local>) {
        let elapsed = (now - activated_at)
            .to_std()
            .map_or(0.0, |elapsed| elapsed.as_secs_f64());

        match self.accumulator.add_active_seconds(now, elapsed) {
            Ok(today) => {
                tracing::info!(
                    switch = %self.name,
                    active_secs = elapsed,
                    today_secs = today,
                    "Deactivated"
                );
            }
            Err(e) => {
                tracing::error!(
                    switch = %self.name,
                    active_secs = elapsed,
                    error = %e,
                    "Deactivated, but failed to record active time"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::{TimeDelta, TimeZone};
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::adapter::Reading;
    use crate::clock::ManualClock;
    use crate::error::{DeviceError, Error, ProtocolError};
    use crate::store::{KeyValueStore, MemoryStore};

    /// A relay simulated in memory.
    #[derive(Default)]
    struct FakeDevice {
        on: Mutex<bool>,
        power: Mutex<i64>,
        unreachable: Mutex<bool>,
        reject_commands: Mutex<bool>,
        drop_after_command: Mutex<bool>,
        commands: Mutex<Vec<bool>>,
        queries: AtomicUsize,
    }

    struct FakeAdapter(Arc<FakeDevice>);

    impl SwitchAdapter for FakeAdapter {
        fn generation(&self) -> Generation {
            Generation::Rpc
        }

        async fn supports(&self) -> Result<bool> {
            Ok(true)
        }

        async fn query(&self) -> Result<Reading> {
            self.0.queries.fetch_add(1, Ordering::SeqCst);
            if *self.0.unreachable.lock() {
                return Err(ProtocolError::ConnectionFailed("unreachable".to_string()).into());
            }
            Ok(Reading {
                on: *self.0.on.lock(),
                power: *self.0.power.lock(),
            })
        }

        async fn switch(&self, on: bool) -> Result<()> {
            if *self.0.unreachable.lock() {
                return Err(ProtocolError::ConnectionFailed("unreachable".to_string()).into());
            }
            if *self.0.reject_commands.lock() {
                return Err(DeviceError::CommandRejected {
                    uri: "/rpc/Switch.Set".to_string(),
                    status: 500,
                    body: String::new(),
                }
                .into());
            }
            self.0.commands.lock().push(on);
            *self.0.on.lock() = on;
            if *self.0.drop_after_command.lock() {
                *self.0.unreachable.lock() = true;
            }
            Ok(())
        }

        fn close(&self) {}
    }

    struct Fixture {
        switch: Switch<FakeAdapter>,
        device: Arc<FakeDevice>,
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
        notifications: Arc<AtomicUsize>,
    }

    fn t0() -> DateTime<Local> {
        // day 100 of 2026
        Local.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
    }

    async fn fixture(device_on: bool) -> Fixture {
        let device = Arc::new(FakeDevice::default());
        *device.on.lock() = device_on;
        let clock = Arc::new(ManualClock::new(t0()));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let notifications = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&notifications);
        let switch = SwitchBuilder::new(
            SwitchConfig::new("http://192.168.1.40").with_poll_interval(Duration::from_secs(3)),
        )
        .with_name("heater")
        .with_clock(clock.clone())
        .with_store(store.clone())
        .with_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build_with_adapter(FakeAdapter(Arc::clone(&device)))
        .await
        .unwrap();

        Fixture {
            switch,
            device,
            clock,
            store,
            notifications,
        }
    }

    #[tokio::test]
    async fn build_reads_initial_state() {
        let f = fixture(true).await;

        assert_eq!(f.switch.name(), "heater");
        assert!(f.switch.is_on());
        assert_eq!(f.switch.last_activation_time(), t0());
        assert_eq!(f.device.queries.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_sync_leaves_state_untouched() {
        let f = fixture(true).await;
        *f.device.power.lock() = 40;
        f.switch.sync().await.unwrap();
        let before = f.switch.state();

        *f.device.unreachable.lock() = true;
        *f.device.on.lock() = false;
        f.clock.advance(TimeDelta::seconds(10));

        assert!(f.switch.sync().await.unwrap_err().is_transport());
        assert_eq!(f.switch.state(), before);
        assert_eq!(f.notifications.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn repeated_on_observation_keeps_activation_time() {
        let f = fixture(false).await;
        *f.device.on.lock() = true;

        f.clock.advance(TimeDelta::seconds(3));
        f.switch.sync().await.unwrap();
        let activated = f.switch.last_activation_time();
        assert_eq!(activated, t0() + TimeDelta::seconds(3));

        f.clock.advance(TimeDelta::seconds(3));
        f.switch.sync().await.unwrap();
        assert_eq!(f.switch.last_activation_time(), activated);
    }

    #[tokio::test]
    async fn observed_deactivation_is_not_accumulated() {
        let f = fixture(true).await;

        *f.device.on.lock() = false;
        f.clock.advance(TimeDelta::seconds(600));
        f.switch.sync().await.unwrap();

        assert!(!f.switch.is_on());
        assert_eq!(f.switch.last_deactivation_time(), t0() + TimeDelta::seconds(600));
        assert_eq!(f.switch.active_seconds_for_day(100), None);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn set_on_when_already_on_sends_nothing() {
        let f = fixture(true).await;

        f.switch.set_on(true).await.unwrap();

        assert!(f.device.commands.lock().is_empty());
        assert!(f.store.is_empty());
        // initial read plus the read back
        assert_eq!(f.device.queries.load(Ordering::SeqCst), 2);
        assert_eq!(f.notifications.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn set_off_adds_elapsed_time_to_today() {
        let f = fixture(false).await;
        f.store.put("100", json!(200.0), crate::accumulator::ENTRY_TTL).unwrap();

        f.switch.set_on(true).await.unwrap();
        assert_eq!(f.switch.last_activation_time(), t0());

        f.clock.advance(TimeDelta::seconds(125));
        f.switch.set_on(false).await.unwrap();

        assert_eq!(*f.device.commands.lock(), vec![true, false]);
        assert!(!f.switch.is_on());
        assert_eq!(f.switch.last_deactivation_time(), t0() + TimeDelta::seconds(125));
        assert_eq!(f.switch.active_seconds_for_day(100), Some(325.0));
    }

    #[tokio::test]
    async fn set_off_after_midnight_adds_to_new_day_only() {
        let f = fixture(false).await;
        f.store.put("100", json!(300.0), crate::accumulator::ENTRY_TTL).unwrap();

        f.clock.set(Local.with_ymd_and_hms(2026, 4, 10, 23, 50, 0).unwrap());
        f.switch.set_on(true).await.unwrap();
        f.clock.advance(TimeDelta::minutes(20));
        f.switch.set_on(false).await.unwrap();

        assert_eq!(f.switch.active_seconds_for_day(100), Some(300.0));
        assert_eq!(f.switch.active_seconds_for_day(101), Some(1200.0));
        assert_eq!(f.switch.hours_today(), 1200.0 / 3600.0);
    }

    #[tokio::test]
    async fn set_off_when_already_off_sends_nothing() {
        let f = fixture(false).await;
        let deactivated = f.switch.last_deactivation_time();

        f.clock.advance(TimeDelta::seconds(30));
        f.switch.set_on(false).await.unwrap();

        assert!(f.device.commands.lock().is_empty());
        assert_eq!(f.switch.last_deactivation_time(), deactivated);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn rejected_command_leaves_state_untouched() {
        let f = fixture(false).await;
        let before = f.switch.state();
        *f.device.reject_commands.lock() = true;

        f.clock.advance(TimeDelta::seconds(30));
        let result = f.switch.set_on(true).await;

        assert!(matches!(
            result,
            Err(Error::Device(DeviceError::CommandRejected { .. }))
        ));
        assert_eq!(f.switch.state(), before);
        assert_eq!(f.notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_read_back_still_notifies() {
        let f = fixture(false).await;
        *f.device.drop_after_command.lock() = true;

        let result = f.switch.set_on(true).await;

        assert!(result.unwrap_err().is_transport());
        assert!(f.switch.is_on());
        assert_eq!(*f.device.commands.lock(), vec![true]);
        assert_eq!(f.notifications.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_survives_failures_and_stops() {
        let f = fixture(false).await;
        f.switch.start();
        assert!(f.switch.is_running());

        tokio::time::sleep(Duration::from_secs(7)).await;
        let polled = f.device.queries.load(Ordering::SeqCst);
        assert!(polled >= 3, "polled {polled} times");

        *f.device.unreachable.lock() = true;
        tokio::time::sleep(Duration::from_secs(7)).await;
        let failed = f.device.queries.load(Ordering::SeqCst);
        assert!(failed > polled, "loop stopped after a failure");

        *f.device.unreachable.lock() = false;
        *f.device.on.lock() = true;
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(f.switch.is_on());

        f.switch.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!f.switch.is_running());
        let stopped_at = f.device.queries.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.device.queries.load(Ordering::SeqCst), stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_ends_when_switch_is_dropped() {
        let f = fixture(false).await;
        f.switch.start();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let device = Arc::clone(&f.device);
        drop(f);
        tokio::time::sleep(Duration::from_secs(4)).await;
        let after_drop = device.queries.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(device.queries.load(Ordering::SeqCst), after_drop);
    }
}
