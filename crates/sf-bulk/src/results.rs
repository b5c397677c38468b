//! Categorized results of completed ingest jobs.

use tracing::{info, instrument};

use sf_bulkjobs_client::HttpTransport;

use crate::client::JobClient;
use crate::error::Result;
use crate::types::{IngestResults, Record, ResultCategory};

/// Retrieves the successful, failed and unprocessed rows of an ingest job.
///
/// Each set is a single unpaginated CSV download. Successful rows carry
/// `sf__Id` and `sf__Created`, failed rows carry `sf__Id` and `sf__Error`,
/// both followed by the originally uploaded columns.
#[derive(Debug)]
pub struct ResultFetcher<'a, T> {
    client: &'a JobClient<T>,
}

impl<'a, T: HttpTransport> ResultFetcher<'a, T> {
    pub fn new(client: &'a JobClient<T>) -> Self {
        Self { client }
    }

    /// Fetch one result set.
    pub async fn fetch(&self, job_id: &str, category: ResultCategory) -> Result<Vec<Record>> {
        self.client.fetch_categorized(job_id, category).await
    }

    pub async fn successful(&self, job_id: &str) -> Result<Vec<Record>> {
        self.fetch(job_id, ResultCategory::Successful).await
    }

    pub async fn failed(&self, job_id: &str) -> Result<Vec<Record>> {
        self.fetch(job_id, ResultCategory::Failed).await
    }

    pub async fn unprocessed(&self, job_id: &str) -> Result<Vec<Record>> {
        self.fetch(job_id, ResultCategory::Unprocessed).await
    }

    /// Fetch all three sets, one after another.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, job_id: &str) -> Result<IngestResults> {
        let results = IngestResults {
            successful: self.successful(job_id).await?,
            failed: self.failed(job_id).await?,
            unprocessed: self.unprocessed(job_id).await?,
        };
        info!(
            successful = results.successful.len(),
            failed = results.failed.len(),
            unprocessed = results.unprocessed.len(),
            "Fetched ingest results"
        );
        Ok(results)
    }
}
