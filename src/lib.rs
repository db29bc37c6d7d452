// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `shelly_switch` - A Rust library to track and control Shelly relay switches.
//!
//! This library provides an async controller for a single relay switch reached
//! over HTTP. It keeps the last known relay state and power draw, records when
//! the relay went on and off, and persists how long it stayed on each day.
//!
//! # Supported Features
//!
//! - **Dialect detection**: first generation (`/status`, `/relay/0`) and RPC
//!   (`/rpc/Switch.*`) firmware, probed once at construction
//! - **Relay control**: switch on/off, no command sent when already in state
//! - **Polling**: background task refreshing the state at a fixed interval
//! - **Active time**: seconds per day of year, kept for one year, with hours
//!   today, hours this year and a full year estimate
//! - **Change notification**: one listener run after every read or command
//!
//! # Quick Start
//!
//! ```no_run
//! use shelly_switch::Switch;
//!
//! #[tokio::main]
//! async fn main() -> shelly_switch::Result<()> {
//!     // Probes the firmware and reads the initial state
//!     let switch = Switch::http("192.168.1.40")
//!         .with_name("heater")
//!         .with_store_directory("/var/lib/switch")
//!         .build()
//!         .await?;
//!
//!     switch.set_listener(|| println!("state changed"));
//!     switch.start();
//!
//!     switch.set_on(true).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     switch.set_on(false).await?;
//!
//!     println!("{:.2} h today", switch.hours_today());
//!     switch.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Store and Clock
//!
//! ```no_run
//! use std::sync::Arc;
//! use shelly_switch::{MemoryStore, Switch, SystemClock};
//!
//! # async fn example() -> shelly_switch::Result<()> {
//! let switch = Switch::http("http://192.168.1.40")
//!     .with_store(Arc::new(MemoryStore::new()))
//!     .with_clock(Arc::new(SystemClock))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod adapter;
pub mod clock;
pub mod error;
pub mod protocol;
pub mod response;
pub mod state;
pub mod store;
pub mod switch;

pub use accumulator::DailyAccumulator;
pub use adapter::{Generation, Reading, ShellyAdapter, SwitchAdapter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, StoreError};
#[cfg(feature = "http")]
pub use protocol::{HttpConfig, HttpTransport};
pub use state::{SwitchState, Transition};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
#[cfg(feature = "http")]
pub use switch::HttpSwitch;
pub use switch::{Switch, SwitchBuilder, SwitchConfig};
