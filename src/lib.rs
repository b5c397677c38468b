//! # sf-bulkjobs-api
//!
//! Salesforce Bulk API 2.0 job orchestration for Rust.
//!
//! Large data loads and extracts run as asynchronous jobs on the Salesforce
//! side. This library drives those jobs: create, upload, close, poll with
//! capped backoff, page through query results, and fetch per-row outcomes.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Tracing spans skip tokens and payloads
//! - Error bodies are sanitized and truncated before they reach messages
//!
//! ## Crates
//!
//! - **sf-bulkjobs-client** - HTTP transport and session-bound client
//! - **sf-bulkjobs-auth** - Session context: instance URL, API version, token
//! - **sf-bulkjobs** - Job client, poller, ingest and query orchestration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sf_bulkjobs_api::{BulkApiClient, BulkOperation, SalesforceCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = SalesforceCredentials::from_env()?;
//!     let client = BulkApiClient::from_credentials(&creds)?;
//!
//!     let summary = client
//!         .execute_ingest("Account", BulkOperation::Insert, "Name\nAcme\nGlobex", None)
//!         .await?;
//!     println!("{} processed, {} failed", summary.records_processed, summary.records_failed);
//!
//!     for row in client.execute_query("SELECT Id, Name FROM Account", false).await? {
//!         println!("{}", row["Name"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use sf_bulkjobs_auth as auth;
#[cfg(feature = "bulk")]
pub use sf_bulkjobs as bulk;
#[cfg(feature = "client")]
pub use sf_bulkjobs_client as client;

#[cfg(feature = "auth")]
pub use sf_bulkjobs_auth::{Credentials, SalesforceCredentials};
#[cfg(feature = "bulk")]
pub use sf_bulkjobs::{
    BulkApiClient, BulkConfig, BulkOperation, IngestSummary, JobClient, JobState, Record,
};
#[cfg(feature = "client")]
pub use sf_bulkjobs_client::{ClientConfig, SalesforceClient};
