// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::protocol::{Transport, TransportResponse};

/// What the scripted transport answers to the next request.
pub(crate) enum Reply {
    Ok(u16, &'static str),
    Fail,
}

#[derive(Default)]
pub(crate) struct Journal {
    pub requests: Vec<String>,
    pub renewals: usize,
    pub closed: bool,
}

/// Answers requests from a queue; an empty queue fails like a dead network.
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> (Self, Arc<Mutex<Journal>>) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let transport = Self {
            replies: Mutex::new(replies.into()),
            journal: Arc::clone(&journal),
        };
        (transport, journal)
    }
}

impl Transport for ScriptedTransport {
    fn base_url(&self) -> &str {
        "http://scripted"
    }

    async fn get(&self, path_and_query: &str) -> Result<TransportResponse, ProtocolError> {
        self.journal.lock().requests.push(path_and_query.to_string());
        match self.replies.lock().pop_front() {
            Some(Reply::Ok(status, body)) => Ok(TransportResponse::new(status, body)),
            Some(Reply::Fail) | None => Err(ProtocolError::ConnectionFailed(
                "connection reset by peer".to_string(),
            )),
        }
    }

    fn renew(&self) {
        self.journal.lock().renewals += 1;
    }

    fn close(&self) {
        self.journal.lock().closed = true;
    }
}
