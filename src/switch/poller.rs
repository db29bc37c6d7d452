// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background polling task.
//!
//! One task per switch calls `sync` at a fixed interval. A failed sync is
//! logged and retried on the next tick; there is no backoff. Stopping is
//! cooperative: the flag is checked before every sync, and an in-flight
//! request always runs to completion (or to its timeout).

use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::adapter::SwitchAdapter;

use super::SwitchInner;

/// Stop signal of one run of the loop.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: AtomicBool,
    wake: Notify,
}

impl StopSignal {
    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        // stores a permit if the loop is not sleeping right now
        self.wake.notify_one();
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Run {
    signal: Arc<StopSignal>,
    task: JoinHandle<()>,
}

/// Owns the polling task of a switch.
#[derive(Debug)]
pub(crate) struct Poller {
    interval: Duration,
    run: Mutex<Option<Run>>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            run: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the loop unless it is already running.
    pub fn start<A: SwitchAdapter + 'static>(&self, switch: Weak<SwitchInner<A>>) {
        let mut run = self.run.lock();
        if run.as_ref().is_some_and(Run::is_active) {
            return;
        }
        let signal = Arc::new(StopSignal::default());
        let task = tokio::spawn(poll(switch, Arc::clone(&signal), self.interval));
        *run = Some(Run { signal, task });
    }

    /// Asks the loop to exit before its next sync.
    pub fn stop(&self) {
        if let Some(run) = self.run.lock().as_ref() {
            run.signal.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.lock().as_ref().is_some_and(Run::is_active)
    }
}

impl Run {
    fn is_active(&self) -> bool {
        !self.signal.is_stopped() && !self.task.is_finished()
    }
}

async fn poll<A: SwitchAdapter + 'static>(
    switch: Weak<SwitchInner<A>>,
    signal: Arc<StopSignal>,
    interval: Duration,
) {
    loop {
        if signal.is_stopped() {
            break;
        }
        // the switch was dropped
        let Some(switch) = switch.upgrade() else {
            break;
        };
        if let Err(e) = switch.sync().await {
            tracing::warn!(switch = %switch.name, error = %e, "Error occurred on sync");
        }
        drop(switch);

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = signal.wake.notified() => {}
        }
    }
    tracing::debug!("Polling stopped");
}
