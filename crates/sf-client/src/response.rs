//! Buffered HTTP responses with Salesforce-specific helpers.
//!
//! The body is read fully before the response is handed to callers, so a
//! `Response` is plain data: status, headers and bytes.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{Error, ErrorKind, Result};

/// Maximum length of an error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 500;

static TOKEN_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").expect("static token pattern")
});

static SESSION_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").expect("static session pattern")
});

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Create a response from its parts.
    ///
    /// Header names are normalized to lowercase so lookups are
    /// case-insensitive.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header (builder style).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Read a reqwest response to completion.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Get the Sforce-Locator header (used for Bulk API pagination).
    pub fn sforce_locator(&self) -> Option<&str> {
        self.header("sforce-locator")
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Returns true if the body is empty or whitespace only.
    pub fn is_empty_body(&self) -> bool {
        self.body.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Body decoded as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| {
            Error::with_source(
                ErrorKind::Body("response body is not valid UTF-8".to_string()),
                e,
            )
        })
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    /// Body as lossy text, sanitized and truncated for use in error messages.
    pub fn error_body(&self) -> String {
        sanitize_error_message(&String::from_utf8_lossy(&self.body))
    }

    /// First structured Salesforce error in the body, if the body has one.
    ///
    /// Salesforce returns either a JSON array of errors or a single object.
    pub fn api_error(&self) -> Option<ApiErrorDetail> {
        if let Ok(errors) = serde_json::from_slice::<Vec<SalesforceErrorResponse>>(&self.body) {
            return errors.into_iter().next().map(Into::into);
        }
        serde_json::from_slice::<SalesforceErrorResponse>(&self.body)
            .ok()
            .map(Into::into)
    }
}

/// A Salesforce error entry decoded from an error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorDetail {
    pub error_code: String,
    pub message: String,
}

/// Salesforce API error response format.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
}

impl From<SalesforceErrorResponse> for ApiErrorDetail {
    fn from(err: SalesforceErrorResponse) -> Self {
        Self {
            error_code: err.error_code,
            message: sanitize_error_message(&err.message),
        }
    }
}

/// Sanitize an error message to prevent exposing sensitive data.
///
/// Redacts anything shaped like an access token or session id and truncates
/// long messages.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = TOKEN_PATTERN
        .replace_all(message, "[REDACTED_TOKEN]")
        .to_string();
    sanitized = SESSION_PATTERN
        .replace_all(&sanitized, "sid=[REDACTED]")
        .to_string();

    if sanitized.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
