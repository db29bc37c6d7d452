// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport towards a switch device.
//!
//! Adapters only need to send a GET request and look at the status code and
//! body of the answer. That capability is captured by the [`Transport`] trait
//! so the adapters can be driven by the bundled [`HttpTransport`] or by any
//! other implementation (a test double, a proxy, ...).
//!
//! A transport owns a *session*: the underlying connection pool. After a
//! failure the adapters call [`Transport::renew`] so a possibly broken session
//! is never reused for the next request.

#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use std::future::Future;

use crate::error::{ParseError, ProtocolError};

/// Answer of a device to a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    status: u16,
    body: String,
}

impl TransportResponse {
    /// Creates a new response with the given status code and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns true for a 200 answer.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Parses the body as JSON into the target type.
    ///
    /// # Errors
    ///
    /// Returns error if the body cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// A session able to send GET requests to one device.
///
/// Paths are relative to the device base URL and include the query string,
/// e.g. `/relay/0?turn=on`.
pub trait Transport: Send + Sync {
    /// Returns the base URL of the device, without trailing slash.
    fn base_url(&self) -> &str;

    /// Sends a GET request and returns the status code and body.
    ///
    /// A non-success status is not an error at this level; only a request
    /// that could not complete is.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request cannot be sent or the answer
    /// cannot be read.
    fn get(
        &self,
        path_and_query: &str,
    ) -> impl Future<Output = Result<TransportResponse, ProtocolError>> + Send;

    /// Discards the current session and starts a fresh one.
    ///
    /// Best-effort: failing to clean up the old session must not fail the
    /// caller.
    fn renew(&self);

    /// Releases the session. Subsequent requests fail with
    /// [`ProtocolError::Closed`].
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success_is_200_only() {
        assert!(TransportResponse::new(200, "{}").is_success());
        assert!(!TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(404, "Not Found").is_success());
    }

    #[test]
    fn response_parse_json() {
        let response = TransportResponse::new(200, r#"{"output": true}"#);
        let value: serde_json::Value = response.parse().unwrap();
        assert_eq!(value["output"], serde_json::Value::Bool(true));
    }

    #[test]
    fn response_parse_invalid_json() {
        let response = TransportResponse::new(200, "<html>");
        let result: Result<serde_json::Value, _> = response.parse();
        assert!(matches!(result, Err(ParseError::Json(_))));
    }
}
