// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Active time accumulated per calendar day.
//!
//! Entries are keyed by the zero-padded day of year (`"001"` to `"366"`) and
//! expire 366 days after their last write, so the store never grows beyond
//! one year of history and never needs explicit cleanup.
//!
//! Because an entry outlives its day by up to a year, the same key can still
//! hold last year's value when the day comes round again. Each entry
//! therefore records its year, and an entry from another year reads as
//! absent. A bare number (as written by older tools) counts as current.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Time-to-live of a day entry, counted from its last write.
pub const ENTRY_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

const SECONDS_PER_HOUR: f64 = 3600.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct DayRecord {
    year: i32,
    secs: f64,
}

/// Per-day active seconds backed by a [`KeyValueStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::{Local, TimeZone};
/// use shelly_switch::accumulator::DailyAccumulator;
/// use shelly_switch::clock::ManualClock;
/// use shelly_switch::store::MemoryStore;
///
/// let clock = Arc::new(ManualClock::new(Local.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()));
/// let store = Arc::new(MemoryStore::with_clock(clock.clone()));
/// let accumulator = DailyAccumulator::new(store, clock.clone());
///
/// accumulator.add_active_seconds(Local.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap(), 1800.0)?;
/// assert_eq!(accumulator.active_seconds_for_day(100), Some(1800.0));
/// assert_eq!(accumulator.hours_today(), 0.5);
/// # Ok::<(), shelly_switch::error::StoreError>(())
/// ```
pub struct DailyAccumulator {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl DailyAccumulator {
    /// Creates an accumulator over `store`; "today" follows `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the store key of a day of year.
    #[must_use]
    pub fn day_key(day_of_year: u32) -> String {
        format!("{day_of_year:03}")
    }

    /// Adds `secs` to the entry of the day `at` falls on and returns the new total.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot persist the entry.
    pub fn add_active_seconds(&self, at: DateTime<Local>, secs: f64) -> Result<f64, StoreError> {
        let day = at.ordinal();
        let year = at.year();
        let total = self.stored_seconds(day, year).unwrap_or(0.0) + secs.max(0.0);
        let record = DayRecord { year, secs: total };
        self.store
            .put(&Self::day_key(day), serde_json::to_value(record)?, ENTRY_TTL)?;
        Ok(total)
    }

    /// Returns the active seconds of a day of the current year.
    ///
    /// `None` when nothing positive was recorded: a day with zero seconds is
    /// not told apart from a day without entry.
    #[must_use]
    pub fn active_seconds_for_day(&self, day_of_year: u32) -> Option<f64> {
        self.stored_seconds(day_of_year, self.clock.now().year())
            .filter(|secs| *secs > 0.0)
    }

    /// Returns the active hours of a day of the current year, 0 if unknown.
    #[must_use]
    pub fn active_hours_for_day(&self, day_of_year: u32) -> f64 {
        self.stored_seconds(day_of_year, self.clock.now().year())
            .map_or(0.0, |secs| secs / SECONDS_PER_HOUR)
    }

    /// Returns the active hours of today.
    #[must_use]
    pub fn hours_today(&self) -> f64 {
        self.active_hours_for_day(self.clock.now().ordinal())
    }

    /// Returns the active hours since January 1st, today included.
    #[must_use]
    pub fn hours_current_year(&self) -> f64 {
        let today = self.clock.now().ordinal();
        self.sum_hours(1..=today)
    }

    /// Extrapolates the hours since January 1st to a full year.
    ///
    /// Averages [`hours_current_year`](Self::hours_current_year) over the days
    /// elapsed so far, today included.
    #[must_use]
    pub fn estimated_year_hours(&self) -> f64 {
        let today = self.clock.now().ordinal();
        self.sum_hours(1..=today) * DAYS_PER_YEAR / f64::from(today)
    }

    fn sum_hours(&self, days: std::ops::RangeInclusive<u32>) -> f64 {
        days.map(|day| self.active_hours_for_day(day)).sum()
    }

    fn stored_seconds(&self, day_of_year: u32, year: i32) -> Option<f64> {
        match self.store.get(&Self::day_key(day_of_year))? {
            Value::Number(n) => n.as_f64(),
            value => match serde_json::from_value::<DayRecord>(value) {
                Ok(record) if record.year == year => Some(record.secs),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(day = day_of_year, error = %e, "Ignoring malformed day entry");
                    None
                }
            },
        }
    }
}

impl std::fmt::Debug for DailyAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyAccumulator").finish_non_exhaustive()
    }
}
