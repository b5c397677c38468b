//! Session-bound Salesforce client.
//!
//! `SalesforceClient` pairs an [`HttpTransport`] with the read-only session
//! context (instance URL, API version, bearer token) and knows where the
//! ingest and query job collections live.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Sensitive parameters are skipped in tracing spans

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::Response;
use crate::transport::HttpTransport;
use crate::DEFAULT_API_VERSION;

/// Salesforce API client bound to one session.
///
/// Cloning is cheap: the reqwest connection pool is shared by handle, and
/// the session fields are never mutated after construction, so clones can be
/// handed to independent tasks.
///
/// # Example
///
/// ```rust,ignore
/// use sf_bulkjobs_client::SalesforceClient;
///
/// let client = SalesforceClient::new("https://na1.salesforce.com", "token")?
///     .with_api_version("61.0");
///
/// assert_eq!(
///     client.ingest_jobs_url(),
///     "https://na1.salesforce.com/services/data/v61.0/jobs/ingest"
/// );
/// ```
#[derive(Clone)]
pub struct SalesforceClient<T = SfHttpClient> {
    transport: T,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl<T> std::fmt::Debug for SalesforceClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient<SfHttpClient> {
    /// Create a new Salesforce client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new Salesforce client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Self::with_transport(http, instance_url, access_token)
    }
}

impl<T: HttpTransport> SalesforceClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        transport: T,
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&instance_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::new(ErrorKind::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            ))));
        }

        Ok(Self {
            transport,
            instance_url,
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the full URL for a path.
    ///
    /// If the path starts with `/`, it's appended to the instance URL.
    /// Full URLs are passed through unchanged.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// Build the Bulk API 2.0 URL for a path under `jobs/`.
    pub fn bulk_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/jobs/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Base URL of the ingest job collection.
    pub fn ingest_jobs_url(&self) -> String {
        self.bulk_url("ingest")
    }

    /// Base URL of the query job collection.
    pub fn query_jobs_url(&self) -> String {
        self.bulk_url("query")
    }

    fn request(&self, method: RequestMethod, url: &str) -> RequestBuilder {
        RequestBuilder::new(method, url).bearer_auth(&self.access_token)
    }

    /// Create a GET request builder with authentication.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(RequestMethod::Get, url)
    }

    /// Create a POST request builder with authentication.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder with authentication.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(RequestMethod::Patch, url)
    }

    /// Create a PUT request builder with authentication.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(RequestMethod::Put, url)
    }

    /// Create a DELETE request builder with authentication.
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(RequestMethod::Delete, url)
    }

    /// Send a request through the transport and return the raw response.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.transport.send(request).await
    }
}
