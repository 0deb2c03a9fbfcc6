//! Core Grouper WS protocol types.
//!
//! This module provides the enumerated protocol revisions the client can speak
//! and the URI scheme used to reach the service.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Path prefix shared by every Grouper WS JSON endpoint.
pub const SERVICE_PATH_PREFIX: &str = "grouper-ws/servicesRest/json";

/// Supported Grouper WS protocol revisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WsVersion {
    /// Grouper WS 2.2
    #[default]
    #[serde(rename = "v2_2_000")]
    V2_2_000,
    /// Grouper WS 2.3
    #[serde(rename = "v2_3_000")]
    V2_3_000,
    /// Grouper WS 2.4
    #[serde(rename = "v2_4_000")]
    V2_4_000,
    /// Grouper WS 2.5
    #[serde(rename = "v2_5_000")]
    V2_5_000,
    /// Grouper WS 4.0
    #[serde(rename = "v4_0_000")]
    V4_0_000,
}

impl WsVersion {
    /// Returns the version tag used in request URIs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V2_2_000 => "v2_2_000",
            Self::V2_3_000 => "v2_3_000",
            Self::V2_4_000 => "v2_4_000",
            Self::V2_5_000 => "v2_5_000",
            Self::V4_0_000 => "v4_0_000",
        }
    }

    /// Returns all supported versions, oldest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::V2_2_000,
            Self::V2_3_000,
            Self::V2_4_000,
            Self::V2_5_000,
            Self::V4_0_000,
        ]
    }

    /// Returns true if POST bodies must be sent as `text/x-json`.
    ///
    /// Servers older than 2.4 reject `application/json` on POST.
    #[must_use]
    pub const fn requires_legacy_content_type(&self) -> bool {
        matches!(self, Self::V2_2_000 | Self::V2_3_000)
    }
}

impl FromStr for WsVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| Error::ValidationError(format!("Invalid Grouper WS version: {s}")))
    }
}

impl std::fmt::Display for WsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URI scheme used to reach the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// HTTPS
    #[default]
    Https,
    /// Plain HTTP, for local gateways and test servers
    Http,
}

impl Scheme {
    /// Returns the scheme as it appears in a URI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
