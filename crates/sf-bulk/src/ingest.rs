//! End-to-end ingest workflow: create, upload, close, wait.
//!
//! Once the job exists, any failure triggers one abort request before the
//! original error is returned. The abort's own outcome is only logged.

use std::time::Duration;

use bytes::Bytes;
use tracing::{info, instrument, warn};

use sf_bulkjobs_client::HttpTransport;

use crate::client::JobClient;
use crate::error::{Error, ErrorKind, Result};
use crate::poller::Poller;
use crate::results::ResultFetcher;
use crate::types::{BulkOperation, IngestOutcome, IngestSummary, Job, JobKind, JobSpec};

/// Drives an ingest job from creation to a terminal state.
#[derive(Debug)]
pub struct IngestOrchestrator<'a, T> {
    client: &'a JobClient<T>,
}

impl<'a, T: HttpTransport> IngestOrchestrator<'a, T> {
    pub fn new(client: &'a JobClient<T>) -> Self {
        Self { client }
    }

    /// Load `csv_payload` into `object` and wait for the job to finish.
    ///
    /// The payload must start with a header row of field names. For
    /// `delete` and `hardDelete` it must contain only an `Id` column.
    /// `external_id_field` is required for upserts and rejected otherwise.
    #[instrument(skip(self, csv_payload))]
    pub async fn run(
        &self,
        object: &str,
        operation: BulkOperation,
        csv_payload: impl Into<Bytes>,
        external_id_field: Option<&str>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<IngestSummary> {
        let context = format!("{operation} {object}");
        if operation.is_query() {
            return Err(Error::new(ErrorKind::InvalidSpec(format!(
                "{operation} is not an ingest operation"
            )))
            .with_context(context));
        }

        let mut spec = JobSpec::ingest(object, operation);
        spec.external_id_field = external_id_field.map(str::to_string);

        let job = self
            .client
            .create(&spec)
            .await
            .map_err(|e| e.with_context(&context))?;

        let payload = csv_payload.into();
        let finished = async {
            self.client.upload_data(&job.id, payload).await?;
            self.client.close(&job.id).await?;
            Poller::new(self.client)
                .poll(&job.id, JobKind::Ingest, poll_interval, timeout)
                .await
        }
        .await;

        match finished {
            Ok(done) => {
                let summary = IngestSummary::from_job(&done, object);
                info!(
                    job_id = %summary.job_id,
                    processed = summary.records_processed,
                    failed = summary.records_failed,
                    "Ingest job complete"
                );
                Ok(summary)
            }
            Err(err) => {
                self.compensate(&job, &err).await;
                Err(err.with_context(context))
            }
        }
    }

    /// Like [`run`](Self::run), then fetch the three categorized result sets.
    pub async fn run_with_results(
        &self,
        object: &str,
        operation: BulkOperation,
        csv_payload: impl Into<Bytes>,
        external_id_field: Option<&str>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<IngestOutcome> {
        let summary = self
            .run(object, operation, csv_payload, external_id_field, poll_interval, timeout)
            .await?;
        let results = ResultFetcher::new(self.client)
            .fetch_all(&summary.job_id)
            .await
            .map_err(|e| e.with_context(format!("{operation} {object}")))?;
        Ok(IngestOutcome { summary, results })
    }

    async fn compensate(&self, job: &Job, cause: &Error) {
        warn!(job_id = %job.id, error = %cause, "Ingest failed after job creation, aborting job");
        if let Err(abort_err) = self.client.abort(&job.id, JobKind::Ingest).await {
            warn!(job_id = %job.id, error = %abort_err, "Abort request failed");
        }
    }
}
