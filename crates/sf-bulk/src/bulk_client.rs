//! High-level Bulk API 2.0 client.

use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use sf_bulkjobs_auth::Credentials;
use sf_bulkjobs_client::{ClientConfig, HttpTransport, SalesforceClient, SfHttpClient};

use crate::client::JobClient;
use crate::config::BulkConfig;
use crate::error::Result;
use crate::ingest::IngestOrchestrator;
use crate::query::QueryOrchestrator;
use crate::results::ResultFetcher;
use crate::types::*;

/// Salesforce Bulk API 2.0 client.
///
/// Wraps a [`JobClient`] with polling and paging settings so whole
/// workflows are one call.
///
/// # Example
///
/// ```rust,ignore
/// use sf_bulkjobs::{BulkApiClient, BulkOperation};
///
/// let client = BulkApiClient::new("https://myorg.my.salesforce.com", "access_token")?;
///
/// let summary = client
///     .execute_ingest("Account", BulkOperation::Insert, "Name\nAcme\nGlobex", None)
///     .await?;
/// println!("processed {}", summary.records_processed);
///
/// let rows = client.execute_query("SELECT Id, Name FROM Account", false).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BulkApiClient<T = SfHttpClient> {
    jobs: JobClient<T>,
    config: BulkConfig,
}

impl BulkApiClient<SfHttpClient> {
    /// Create a new Bulk API client.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let session = SalesforceClient::new(instance_url, access_token)?;
        Ok(Self::from_client(session))
    }

    /// Create a new Bulk API client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let session = SalesforceClient::with_config(instance_url, access_token, config)?;
        Ok(Self::from_client(session))
    }

    /// Create a client from a session context.
    pub fn from_credentials(credentials: &impl Credentials) -> Result<Self> {
        let session =
            SalesforceClient::new(credentials.instance_url(), credentials.access_token())?
                .with_api_version(credentials.api_version());
        Ok(Self::from_client(session))
    }
}

impl<T: HttpTransport> BulkApiClient<T> {
    /// Create a Bulk API client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient<T>) -> Self {
        Self {
            jobs: JobClient::new(client),
            config: BulkConfig::default(),
        }
    }

    /// The job resource client.
    pub fn jobs(&self) -> &JobClient<T> {
        &self.jobs
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    pub fn instance_url(&self) -> &str {
        self.jobs.session().instance_url()
    }

    pub fn api_version(&self) -> &str {
        self.jobs.session().api_version()
    }

    /// Replace polling and paging settings.
    pub fn with_bulk_config(mut self, config: BulkConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the polling interval for job status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the maximum wait time for job completion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn ingest(&self) -> IngestOrchestrator<'_, T> {
        IngestOrchestrator::new(&self.jobs)
    }

    pub fn query(&self) -> QueryOrchestrator<'_, T> {
        QueryOrchestrator::new(&self.jobs)
    }

    pub fn results(&self) -> ResultFetcher<'_, T> {
        ResultFetcher::new(&self.jobs)
    }

    /// Execute a complete ingest operation.
    pub async fn execute_ingest(
        &self,
        sobject: &str,
        operation: BulkOperation,
        csv_data: impl Into<Bytes>,
        external_id_field: Option<&str>,
    ) -> Result<IngestSummary> {
        self.ingest()
            .run(
                sobject,
                operation,
                csv_data,
                external_id_field,
                self.config.poll_interval,
                self.config.timeout,
            )
            .await
    }

    /// Execute an ingest operation and fetch its categorized results.
    pub async fn execute_ingest_with_results(
        &self,
        sobject: &str,
        operation: BulkOperation,
        csv_data: impl Into<Bytes>,
        external_id_field: Option<&str>,
    ) -> Result<IngestOutcome> {
        self.ingest()
            .run_with_results(
                sobject,
                operation,
                csv_data,
                external_id_field,
                self.config.poll_interval,
                self.config.timeout,
            )
            .await
    }

    /// Run a query and return every row.
    pub async fn execute_query(&self, soql: &str, include_deleted: bool) -> Result<Vec<Record>> {
        self.execute_query_as(soql, include_deleted).await
    }

    /// Run a query and deserialize every row into `R`.
    pub async fn execute_query_as<R: DeserializeOwned>(
        &self,
        soql: &str,
        include_deleted: bool,
    ) -> Result<Vec<R>> {
        self.query()
            .run_typed(
                soql,
                include_deleted,
                self.config.poll_interval,
                self.config.timeout,
                self.config.max_records_per_page,
            )
            .await
    }
}
