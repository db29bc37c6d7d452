// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON file backed store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::store::{Entry, KeyValueStore};

/// Store persisted as `<directory>/<name>.json`.
///
/// The whole file is loaded at open and rewritten on every `put`. Writes go
/// to a temporary file first and are renamed over the previous version.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use shelly_switch::store::{JsonFileStore, KeyValueStore};
///
/// # fn example() -> Result<(), shelly_switch::error::StoreError> {
/// let store = JsonFileStore::open("/var/lib/switch", "switch_192_168_1_40")?;
/// store.put("100", serde_json::json!(325.0), Duration::from_secs(60))?;
/// # Ok(())
/// # }
/// ```
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl JsonFileStore {
    /// Opens (or creates) the store `name` inside `directory`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or an existing file
    /// cannot be read or parsed.
    pub fn open(directory: impl AsRef<Path>, name: &str) -> Result<Self, StoreError> {
        Self::open_with_clock(directory, name, Arc::new(SystemClock))
    }

    /// Like [`open`](Self::open), with expiry following `clock`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or an existing file
    /// cannot be read or parsed.
    pub fn open_with_clock(
        directory: impl AsRef<Path>,
        name: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        let path = directory.join(format!("{name}.json"));

        let mut entries: BTreeMap<String, Entry> = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };

        let now = clock.now().to_utc();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            expired = before - entries.len(),
            "Opened store"
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            clock,
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, Entry>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now().to_utc();
        self.entries
            .lock()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.now().to_utc();
        let mut entries = self.entries.lock();
        // only a persisted map becomes visible to `get`
        let mut next = entries.clone();
        next.retain(|_, entry| !entry.is_expired(now));
        next.insert(key.to_string(), Entry::new(value, now, ttl));
        self.write(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeDelta, TimeZone};

    use super::*;
    use crate::clock::ManualClock;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();

        let store = JsonFileStore::open_with_clock(dir.path(), "switch_a", clock.clone()).unwrap();
        store.put("100", Value::from(325.0), DAY).unwrap();
        drop(store);

        let store = JsonFileStore::open_with_clock(dir.path(), "switch_a", clock).unwrap();
        assert_eq!(store.get("100"), Some(Value::from(325.0)));
        assert!(store.path().ends_with("switch_a.json"));
    }

    #[test]
    fn stores_are_isolated_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();

        let a = JsonFileStore::open_with_clock(dir.path(), "switch_a", clock.clone()).unwrap();
        let b = JsonFileStore::open_with_clock(dir.path(), "switch_b", clock).unwrap();
        a.put("100", Value::from(1), DAY).unwrap();

        assert_eq!(b.get("100"), None);
    }

    #[test]
    fn expired_entries_are_purged_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let clock = clock();

        let store = JsonFileStore::open_with_clock(dir.path(), "switch_a", clock.clone()).unwrap();
        store.put("100", Value::from(1), DAY).unwrap();
        store.put("101", Value::from(2), DAY * 3).unwrap();
        drop(store);

        clock.advance(TimeDelta::days(2));
        let store = JsonFileStore::open_with_clock(dir.path(), "switch_a", clock).unwrap();
        assert_eq!(store.get("100"), None);
        assert_eq!(store.get_or("100", Value::from(0)), Value::from(0));
        assert_eq!(store.get("101"), Some(Value::from(2)));
        assert_eq!(store.entries.lock().len(), 1);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().join("store");
        let store = JsonFileStore::open_with_clock(&directory, "switch_a", clock()).unwrap();
        store.put("100", Value::from(200.0), DAY).unwrap();

        fs::remove_dir_all(&directory).unwrap();
        let result = store.put("100", Value::from(325.0), DAY);

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.get("100"), Some(Value::from(200.0)));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("switch_a.json"), "not json").unwrap();

        let result = JsonFileStore::open(dir.path(), "switch_a");
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
