//! # sf-bulkjobs
//!
//! Orchestration of Salesforce Bulk API 2.0 jobs.
//!
//! ## Components
//!
//! - [`JobClient`] - single-shot calls on job resources
//! - [`Poller`] - waits for a terminal state with capped exponential backoff
//! - [`IngestOrchestrator`] - create, upload, close, wait; aborts the job if
//!   anything fails after it was created
//! - [`QueryOrchestrator`] - create, wait, then follow the result cursor
//! - [`ResultFetcher`] - successful, failed and unprocessed rows of an
//!   ingest job
//! - [`BulkApiClient`] - the above behind one handle with [`BulkConfig`]
//!
//! The remote service is the only authority on job state. Nothing here
//! retries a failed call.
//!
//! ## Example - Bulk Insert
//!
//! ```rust,ignore
//! use sf_bulkjobs::{BulkApiClient, BulkOperation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sf_bulkjobs::Error> {
//!     let client = BulkApiClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token",
//!     )?;
//!
//!     let csv_data = "Name,Industry\nAcme Corp,Technology\nGlobal Inc,Finance";
//!     let summary = client
//!         .execute_ingest("Account", BulkOperation::Insert, csv_data, None)
//!         .await?;
//!
//!     println!("Processed {} records", summary.records_processed);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Paged Query
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use sf_bulkjobs::{BulkConfig, BulkApiClient, Record, ResultPage};
//!
//! let client = BulkApiClient::new(instance_url, access_token)?;
//! let config = BulkConfig::default();
//!
//! client
//!     .query()
//!     .for_each_page(
//!         "SELECT Id, Name FROM Account",
//!         false,
//!         config.poll_interval,
//!         config.timeout,
//!         Some(10_000),
//!         |page: ResultPage<Record>| {
//!             println!("{} rows", page.rows.len());
//!             Ok(())
//!         },
//!     )
//!     .await?;
//! ```

mod bulk_client;
mod client;
mod config;
mod csv_rows;
mod error;
mod ingest;
mod poller;
mod query;
mod results;
mod types;

#[cfg(test)]
mod testing;

pub use bulk_client::BulkApiClient;
pub use client::JobClient;
pub use config::{BulkConfig, DEFAULT_MAX_RECORDS_PER_PAGE, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
pub use csv_rows::{ids_payload, parse_rows, write_rows};
pub use error::{Error, ErrorKind, Result};
pub use ingest::IngestOrchestrator;
pub use poller::{next_delay, Poller, MAX_POLL_DELAY};
pub use query::QueryOrchestrator;
pub use results::ResultFetcher;
pub use types::*;
