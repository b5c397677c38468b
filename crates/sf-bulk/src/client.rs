//! Job resource client.
//!
//! Thin, single-shot wrappers over the ingest and query job collections.
//! Every call sends exactly one request; any status outside 2xx becomes an
//! [`ErrorKind::Remote`] carrying the status, URL and a sanitized body.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use sf_bulkjobs_client::security::url::encode_param;
use sf_bulkjobs_client::{HttpTransport, RequestBuilder, Response, SalesforceClient, SfHttpClient};

use crate::csv_rows::parse_rows;
use crate::error::{Error, ErrorKind, Result};
use crate::types::*;

/// Client for Bulk API 2.0 job resources, bound to one session.
///
/// # Example
///
/// ```rust,ignore
/// use sf_bulkjobs::{BulkOperation, JobClient, JobSpec};
/// use sf_bulkjobs_client::SalesforceClient;
///
/// let session = SalesforceClient::new("https://myorg.my.salesforce.com", "token")?;
/// let jobs = JobClient::new(session);
///
/// let job = jobs.create(&JobSpec::ingest("Account", BulkOperation::Insert)).await?;
/// jobs.upload_data(&job.id, "Name\nAcme\n").await?;
/// jobs.close(&job.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct JobClient<T = SfHttpClient> {
    session: SalesforceClient<T>,
}

impl<T: HttpTransport> JobClient<T> {
    pub fn new(session: SalesforceClient<T>) -> Self {
        Self { session }
    }

    /// The session this client sends requests with.
    pub fn session(&self) -> &SalesforceClient<T> {
        &self.session
    }

    /// URL of a job collection.
    pub fn jobs_url(&self, kind: JobKind) -> String {
        self.session.bulk_url(kind.path())
    }

    /// URL of a single job. The id is percent-encoded as a path segment.
    pub fn job_url(&self, kind: JobKind, job_id: &str) -> String {
        format!("{}/{}", self.jobs_url(kind), encode_param(job_id))
    }

    /// Create a job.
    ///
    /// Ingest jobs must come back `Open`. Query jobs are queued by the
    /// service right away, so any state other than `Failed` or `Aborted`
    /// is accepted for them.
    #[instrument(skip(self, spec), fields(operation = %spec.operation, object = spec.target()))]
    pub async fn create(&self, spec: &JobSpec) -> Result<Job> {
        spec.validate()?;

        let url = self.jobs_url(spec.kind());
        let body = CreateJobRequest::from_spec(spec);
        let request = self.session.post(&url).json(&body)?;
        let job: Job = self.send_json(request, &url).await?;

        let accepted = match spec.kind() {
            JobKind::Ingest => job.state == JobState::Open,
            JobKind::Query => !matches!(job.state, JobState::Failed | JobState::Aborted),
        };
        if !accepted {
            return Err(Error::new(ErrorKind::JobCreation {
                job_id: job.id,
                state: job.state,
            }));
        }

        info!(job_id = %job.id, state = %job.state, "Created job");
        Ok(job)
    }

    /// Upload the CSV payload of an open ingest job.
    ///
    /// Payloads for `delete` and `hardDelete` must contain only an `Id` column.
    #[instrument(skip(self, payload))]
    pub async fn upload_data(&self, job_id: &str, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        let url = format!("{}/batches", self.job_url(JobKind::Ingest, job_id));
        debug!(bytes = payload.len(), "Uploading job data");

        let request = self.session.put(&url).csv(payload);
        self.send_checked(request, &url).await?;
        Ok(())
    }

    /// Mark the upload complete so the service starts processing.
    #[instrument(skip(self))]
    pub async fn close(&self, job_id: &str) -> Result<()> {
        self.set_state(JobKind::Ingest, job_id, UpdateJobStateRequest::upload_complete())
            .await?;
        info!("Closed job");
        Ok(())
    }

    /// Ask the service to stop a job.
    #[instrument(skip(self))]
    pub async fn abort(&self, job_id: &str, kind: JobKind) -> Result<()> {
        self.set_state(kind, job_id, UpdateJobStateRequest::abort())
            .await?;
        info!("Aborted job");
        Ok(())
    }

    async fn set_state(
        &self,
        kind: JobKind,
        job_id: &str,
        state: UpdateJobStateRequest,
    ) -> Result<()> {
        let url = self.job_url(kind, job_id);
        let request = self.session.patch(&url).json(&state)?;
        self.send_checked(request, &url).await?;
        Ok(())
    }

    /// Fetch the current status of a job.
    #[instrument(skip(self))]
    pub async fn get_status(&self, job_id: &str, kind: JobKind) -> Result<Job> {
        let url = self.job_url(kind, job_id);
        let job: Job = self.send_json(self.session.get(&url), &url).await?;
        debug!(
            state = %job.state,
            processed = job.number_records_processed,
            failed = job.number_records_failed,
            "Job status"
        );
        Ok(job)
    }

    /// Fetch one page of query results.
    ///
    /// `cursor` is the value returned by the previous page; `None` or an
    /// empty string requests the first page.
    #[instrument(skip(self))]
    pub async fn fetch_result_page(
        &self,
        job_id: &str,
        cursor: Option<&str>,
        max_records: Option<usize>,
    ) -> Result<ResultPage> {
        self.fetch_result_page_as(job_id, cursor, max_records).await
    }

    /// Fetch one page of query results deserialized into `R`.
    pub async fn fetch_result_page_as<R: DeserializeOwned>(
        &self,
        job_id: &str,
        cursor: Option<&str>,
        max_records: Option<usize>,
    ) -> Result<ResultPage<R>> {
        let url = format!("{}/results", self.job_url(JobKind::Query, job_id));

        let mut request = self.session.get(&url).accept_csv();
        if let Some(max) = max_records {
            request = request.query("maxRecords", max.to_string());
        }
        if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
            request = request.query("locator", cursor);
        }

        let response = self.send_checked(request, &url).await?;
        let rows = parse_rows(response.bytes())?;
        let next_cursor = next_cursor(response.sforce_locator());
        debug!(rows = rows.len(), has_more = next_cursor.is_some(), "Fetched result page");

        Ok(ResultPage { rows, next_cursor })
    }

    /// Fetch one categorized result set of a completed ingest job.
    #[instrument(skip(self))]
    pub async fn fetch_categorized(
        &self,
        job_id: &str,
        category: ResultCategory,
    ) -> Result<Vec<Record>> {
        let url = format!(
            "{}/{}",
            self.job_url(JobKind::Ingest, job_id),
            category.path()
        );
        let response = self
            .send_checked(self.session.get(&url).accept_csv(), &url)
            .await?;
        let rows: Vec<Record> = parse_rows(response.bytes())?;
        debug!(rows = rows.len(), "Fetched {category} results");
        Ok(rows)
    }

    /// Delete a job and its data. Only valid for terminal jobs.
    #[instrument(skip(self))]
    pub async fn delete_job(&self, job_id: &str, kind: JobKind) -> Result<()> {
        let url = self.job_url(kind, job_id);
        self.send_checked(self.session.delete(&url), &url).await?;
        info!("Deleted job");
        Ok(())
    }

    /// List all jobs of one kind, following continuation URLs.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, kind: JobKind) -> Result<Vec<Job>> {
        let mut url = self.jobs_url(kind);
        let mut jobs = Vec::new();

        loop {
            let page: JobList = self.send_json(self.session.get(&url), &url).await?;
            jobs.extend(page.records);

            match page.next_records_url {
                Some(next) if !page.done && !next.is_empty() => url = self.follow_url(&next)?,
                _ => break,
            }
        }

        debug!(count = jobs.len(), "Listed jobs");
        Ok(jobs)
    }

    /// Resolve a service-provided link. Absolute links must stay on the
    /// instance host, since the request carries the bearer token.
    fn follow_url(&self, link: &str) -> Result<String> {
        let url = self.session.url(link);
        let on_instance = url
            .strip_prefix(self.session.instance_url())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']));
        if !on_instance {
            return Err(Error::new(ErrorKind::ForeignUrl(link.to_string())));
        }
        Ok(url)
    }

    /// Send a request and fail on any non-2xx status.
    async fn send_checked(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = self.session.send(request).await?;
        if !response.is_success() {
            return Err(remote_error(&response, url));
        }
        Ok(response)
    }

    async fn send_json<R: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<R> {
        let response = self.send_checked(request, url).await?;
        serde_json::from_slice(response.bytes()).map_err(Into::into)
    }
}

/// Build a remote error from an unsuccessful response.
///
/// Structured Salesforce errors are reduced to `CODE: message`; anything
/// else keeps the sanitized raw body.
pub(crate) fn remote_error(response: &Response, url: &str) -> Error {
    let body = match response.api_error() {
        Some(detail) => format!("{}: {}", detail.error_code, detail.message),
        None => response.error_body(),
    };
    debug!(status = response.status(), %url, "Request failed");
    Error::new(ErrorKind::Remote {
        status: response.status(),
        url: url.to_string(),
        body,
    })
}
