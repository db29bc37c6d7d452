// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `shelly_switch` library.
//!
//! A failed sync or command is always reported as [`Error`]. The variant tells
//! the cause apart: the device could not be reached ([`ProtocolError`]), it
//! answered with something unexpected ([`ParseError`]), it refused a command
//! ([`DeviceError`]), or the active-time store failed ([`StoreError`]).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The device could not be reached.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The device answered with a payload of unexpected shape.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device answered with a non-success status.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The persistent store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl Error {
    /// Returns true if the failure happened before the device answered.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

/// Errors related to the transport towards the device.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The transport was closed and cannot be used anymore.
    #[error("transport is closed")]
    Closed,
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Errors reported by the device itself.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A relay command was answered with a non-success status.
    #[error("command {uri} rejected with HTTP {status}: {body}")]
    CommandRejected {
        /// The requested path.
        uri: String,
        /// HTTP status code returned by the device.
        status: u16,
        /// Response body, as returned by the device.
        body: String,
    },

    /// A status query was answered with a non-success status.
    #[error("query {uri} answered with HTTP {status}")]
    UnexpectedStatus {
        /// The requested path.
        uri: String,
        /// HTTP status code returned by the device.
        status: u16,
    },
}

/// Errors related to the persistent key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
