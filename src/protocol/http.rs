// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport built on `reqwest`.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Client;

use crate::error::ProtocolError;
use crate::protocol::{Transport, TransportResponse};

// ============================================================================
// HttpConfig - Connection parameters of a device
// ============================================================================

/// Configuration for an HTTP switch device.
///
/// # Examples
///
/// ```
/// use shelly_switch::protocol::HttpConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = HttpConfig::new("192.168.1.40");
///
/// // With all options
/// let config = HttpConfig::new("192.168.1.40")
///     .with_port(8080)
///     .with_credentials("admin", "password")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new HTTP configuration for the specified address.
    ///
    /// The address may be a bare host (`192.168.1.40`), a host with port
    /// (`192.168.1.40:8080`) or a URL (`http://192.168.1.40`).
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let (use_https, rest) = if let Some(rest) = address.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = address.strip_prefix("http://") {
            (false, rest)
        } else {
            (false, address.as_str())
        };
        let rest = rest.trim_end_matches('/');
        let default_port = if use_https {
            Self::DEFAULT_HTTPS_PORT
        } else {
            Self::DEFAULT_PORT
        };
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (rest.to_string(), default_port),
            },
            None => (rest.to_string(), default_port),
        };

        Self {
            host,
            port,
            use_https,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets HTTP basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an [`HttpTransport`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_transport(self) -> Result<HttpTransport, ProtocolError> {
        if self.host.is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }
        let client = build_client(self.timeout)?;

        Ok(HttpTransport {
            base_url: self.base_url(),
            client: RwLock::new(Some(client)),
            credentials: self.credentials,
            timeout: self.timeout,
        })
    }
}

fn build_client(timeout: Duration) -> Result<Client, ProtocolError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProtocolError::Http)
}

// ============================================================================
// HttpTransport - Renewable reqwest session
// ============================================================================

/// HTTP session towards one device.
///
/// The `reqwest` client (and with it the connection pool) can be replaced at
/// any time through [`Transport::renew`]. Requests clone the current client
/// handle, so an in-flight request keeps the session it started with.
///
/// # Examples
///
/// ```no_run
/// use shelly_switch::protocol::{HttpConfig, Transport};
///
/// # async fn example() -> shelly_switch::Result<()> {
/// let transport = HttpConfig::new("192.168.1.40").into_transport()?;
/// let response = transport.get("/status").await?;
/// println!("{} {}", response.status(), response.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    client: RwLock<Option<Client>>,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport for the given address with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(address: impl Into<String>) -> Result<Self, ProtocolError> {
        HttpConfig::new(address).into_transport()
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.base_url)
    }
}

impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path_and_query: &str) -> Result<TransportResponse, ProtocolError> {
        let client = self.client.read().clone().ok_or(ProtocolError::Closed)?;
        let url = self.url(path_and_query);

        tracing::debug!(url = %url, "Sending HTTP request");

        let mut request = client.get(&url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                #[allow(clippy::cast_possible_truncation)]
                ProtocolError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ProtocolError::Http(e)
            }
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::trace!(url = %url, status, body = %body, "Received HTTP response");

        Ok(TransportResponse::new(status, body))
    }

    fn renew(&self) {
        tracing::info!(url = %self.base_url, "Renewing HTTP session");
        match build_client(self.timeout) {
            Ok(client) => {
                // dropping the old client closes its idle connections
                *self.client.write() = Some(client);
            }
            Err(e) => {
                tracing::warn!(url = %self.base_url, error = %e, "Failed to renew HTTP session");
            }
        }
    }

    fn close(&self) {
        self.client.write().take();
    }
}
