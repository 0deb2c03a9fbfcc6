//! HTTP transport for the Grouper WS REST API.
//!
//! [`HttpTransport`] turns an [`EndpointPath`] and an optional JSON body into a
//! single authenticated request and hands back the decoded JSON response. The
//! [`Transport`] trait is the seam the operation layer is written against.

use crate::config::ClientConfig;
use crate::types::{WsVersion, SERVICE_PATH_PREFIX};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("grouper-ws/", env!("CARGO_PKG_VERSION"));

/// Standard JSON media type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Media type expected on POST bodies by servers older than 2.4.
pub const LEGACY_JSON_CONTENT_TYPE: &str = "text/x-json";

/// Relative endpoint below the versioned service root, kept as raw segments.
///
/// Segments are percent-encoded individually when the request URI is built, so
/// a group or subject name can never spill into a neighbouring segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPath {
    segments: Vec<String>,
}

impl EndpointPath {
    /// Start a path with its first segment.
    #[must_use]
    pub fn new(first: impl Into<String>) -> Self {
        Self {
            segments: vec![first.into()],
        }
    }

    /// Append a segment.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Returns the raw, unencoded segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for EndpointPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Issues a single request against the Grouper WS API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `method` to `endpoint` with an optional JSON body and return the
    /// decoded JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceError`] on a non-2xx status,
    /// [`Error::TransportError`] on network failure and [`Error::DecodeError`]
    /// when the body is not JSON.
    async fn request(
        &self,
        method: Method,
        endpoint: &EndpointPath,
        body: Option<Value>,
    ) -> Result<Value>;
}

/// `reqwest`-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    username: String,
    password: SecretString,
    version: WsVersion,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the configuration fails validation
    /// or the host does not form a valid URI, and [`Error::TransportError`] if
    /// the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::ValidationError(format!("Invalid configuration: {e}")))?;

        let base_url = service_root(config)?;

        let http = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|err| {
                Error::TransportError(format!("Failed to build Grouper HTTP client: {err}"))
            })?;

        Ok(Self {
            http,
            base_url,
            username: config.username().to_string(),
            password: SecretString::from(config.password()),
            version: config.version(),
        })
    }

    /// Return the versioned service root, ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the protocol version requests are issued under.
    #[must_use]
    pub const fn version(&self) -> WsVersion {
        self.version
    }

    /// Build the full request URI for an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the service root cannot carry path
    /// segments.
    pub fn endpoint_url(&self, endpoint: &EndpointPath) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::ValidationError(format!("Service URL `{}` cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(endpoint.segments());
        Ok(url)
    }

    fn content_type_for(&self, method: &Method) -> &'static str {
        if *method == Method::POST && self.version.requires_legacy_content_type() {
            LEGACY_JSON_CONTENT_TYPE
        } else {
            JSON_CONTENT_TYPE
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        endpoint: &EndpointPath,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = self.endpoint_url(endpoint)?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(ACCEPT, JSON_CONTENT_TYPE);

        if let Some(payload) = body {
            let bytes = serde_json::to_vec(&payload)
                .map_err(|err| Error::ValidationError(format!("Unserializable body: {err}")))?;
            request = request
                .header(CONTENT_TYPE, self.content_type_for(&method))
                .body(bytes);
        }

        debug!(%method, %endpoint, version = %self.version, "Sending Grouper request");

        let response = request.send().await?;
        let status = response.status();
        debug!(%method, %endpoint, %status, "Received Grouper response");

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(%method, %endpoint, %status, "Grouper request failed");
            return Err(Error::http_status(
                status.as_u16(),
                format!("Grouper error {status} for `{endpoint}`: {message}"),
            ));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| {
            Error::DecodeError(format!(
                "Failed to parse Grouper response for `{endpoint}`: {err}"
            ))
        })
    }
}

fn service_root(config: &ClientConfig) -> Result<Url> {
    let raw = format!(
        "{}://{}/{SERVICE_PATH_PREFIX}/{}/",
        config.scheme(),
        config.host(),
        config.version()
    );
    let url = Url::parse(&raw).map_err(|err| {
        Error::ValidationError(format!("Invalid Grouper host `{}`: {err}", config.host()))
    })?;

    // A host carrying its own path or query would shift the service root.
    let expected_path = format!("/{SERVICE_PATH_PREFIX}/{}/", config.version());
    if url.path() != expected_path || url.query().is_some() {
        return Err(Error::ValidationError(format!(
            "Invalid Grouper host `{}`",
            config.host()
        )));
    }

    Ok(url)
}
