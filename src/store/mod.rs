// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistent key-value stores with per-entry expiry.
//!
//! The daily accumulator only needs `get` and `put` with a time-to-live. Two
//! stores are bundled:
//!
//! - [`MemoryStore`]: process-local, lost on restart
//! - [`JsonFileStore`]: one JSON file per store name, survives restarts

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// A key-value store whose entries expire a fixed time after their last write.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`; the entry expires `ttl` after this write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the value cannot be persisted.
    fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the value stored under `key`, or `default`.
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

/// Derives a stable store name from a device address.
///
/// The scheme is dropped and every non-alphanumeric character becomes `_`,
/// so the same device always maps to the same store across restarts.
///
/// # Examples
///
/// ```
/// use shelly_switch::store::store_name_for;
///
/// assert_eq!(store_name_for("http://192.168.1.40"), "switch_192_168_1_40");
/// assert_eq!(store_name_for("Plug-Kitchen.local:8080/"), "switch_plug_kitchen_local_8080");
/// ```
#[must_use]
pub fn store_name_for(address: &str) -> String {
    let address = address.trim();
    let address = address
        .strip_prefix("https://")
        .or_else(|| address.strip_prefix("http://"))
        .unwrap_or(address)
        .trim_end_matches('/');
    let escaped: String = address
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("switch_{escaped}")
}

/// A stored value together with its expiry instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Entry {
    pub value: Value,
    /// `None` when the TTL is too large to be represented.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new(value: Value, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl));
        Self { value, expires_at }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}
