//! # sf-bulkjobs-client
//!
//! HTTP transport infrastructure for the Salesforce job APIs.
//!
//! This crate provides the transport collaborator used by the bulk job
//! orchestration layer:
//! - A small [`HttpTransport`] seam that returns status, headers and raw body
//!   without raising on non-2xx responses
//! - A reqwest-backed implementation ([`SfHttpClient`]) with connection
//!   pooling, compression and request tracing
//! - A session-bound [`SalesforceClient`] that builds job collection URLs and
//!   attaches the bearer token
//!
//! Calls are single-shot. There is no retry layer here: a failed response is
//! handed back to the caller as-is.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Job orchestration (sf-bulk)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient<T>                       │
//! │  - Holds session: instance URL, API version, token          │
//! │  - Builds ingest/query job collection URLs                  │
//! │  - Attaches bearer authentication                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              T: HttpTransport (SfHttpClient)                │
//! │  - Raw HTTP, buffered responses, no status interpretation   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_bulkjobs_client::SalesforceClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sf_bulkjobs_client::Error> {
//!     let client = SalesforceClient::new("https://myorg.my.salesforce.com", "token")?;
//!
//!     let response = client.send(client.get(&client.query_jobs_url())).await?;
//!     println!("status {}", response.status());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod salesforce_client;
pub mod security;
mod transport;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, CompressionConfig};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::{ApiErrorDetail, Response};
pub use salesforce_client::SalesforceClient;
pub use transport::HttpTransport;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sf-bulkjobs/", env!("CARGO_PKG_VERSION"));
