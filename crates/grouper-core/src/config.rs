//! Configuration structures for Grouper WS clients.
//!
//! This module provides the connection settings for a Grouper WS endpoint:
//! host, credentials, protocol version, timeout and URI scheme.

use crate::types::{Scheme, WsVersion};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Upper bound accepted for the request timeout (seconds).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Configuration for a Grouper WS client instance.
///
/// Fields are read-only once constructed; the `with_*` methods consume the
/// configuration and return an updated copy.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientConfig {
    /// Service host, optionally with `:port`
    #[validate(length(min = 1))]
    host: String,

    /// Basic auth username
    #[validate(length(min = 1))]
    username: String,

    /// Basic auth password
    #[serde(skip_serializing)]
    password: SecretString,

    /// Protocol version used in request URIs
    #[serde(default)]
    version: WsVersion,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// URI scheme
    #[serde(default)]
    scheme: Scheme,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    /// Create a new client configuration with required parameters.
    ///
    /// The protocol version defaults to the oldest supported revision and the
    /// timeout to [`DEFAULT_TIMEOUT_SECS`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the host or username is empty.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            host: host.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            version: WsVersion::default(),
            timeout_secs: default_timeout_secs(),
            scheme: Scheme::default(),
        };

        config
            .validate()
            .map_err(|e| Error::ValidationError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set the protocol version.
    #[must_use]
    pub const fn with_version(mut self, version: WsVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the protocol version from its tag, e.g. `v2_5_000`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the tag is not a supported version.
    pub fn with_version_tag(self, tag: &str) -> Result<Self> {
        let version = tag.parse::<WsVersion>()?;
        Ok(self.with_version(version))
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Set the URI scheme.
    #[must_use]
    pub const fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Returns the service host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the basic auth username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the basic auth password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the protocol version.
    #[must_use]
    pub const fn version(&self) -> WsVersion {
        self.version
    }

    /// Returns the URI scheme.
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
