//! Query workflow: create the job, wait for it, page through the results.
//!
//! There is no compensation here. A query job that fails, is aborted or
//! times out is reported as-is.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use sf_bulkjobs_client::HttpTransport;

use crate::client::JobClient;
use crate::error::Result;
use crate::poller::Poller;
use crate::types::{Job, JobKind, JobSpec, Record, ResultPage};

/// Runs a query job and returns its rows in order.
#[derive(Debug)]
pub struct QueryOrchestrator<'a, T> {
    client: &'a JobClient<T>,
}

impl<'a, T: HttpTransport> QueryOrchestrator<'a, T> {
    pub fn new(client: &'a JobClient<T>) -> Self {
        Self { client }
    }

    /// Run `soql` and collect every row.
    ///
    /// `include_deleted` runs a `queryAll` job. `max_records_per_page` of
    /// `None` omits `maxRecords` and lets the service choose the page size.
    /// Pass `Some(DEFAULT_MAX_RECORDS_PER_PAGE)` for 50 000-row pages, which
    /// is what [`BulkApiClient`](crate::BulkApiClient) sends by default.
    pub async fn run(
        &self,
        soql: &str,
        include_deleted: bool,
        poll_interval: Duration,
        timeout: Duration,
        max_records_per_page: Option<usize>,
    ) -> Result<Vec<Record>> {
        self.run_typed(soql, include_deleted, poll_interval, timeout, max_records_per_page)
            .await
    }

    /// Run `soql` and deserialize every row into `R`.
    pub async fn run_typed<R: DeserializeOwned>(
        &self,
        soql: &str,
        include_deleted: bool,
        poll_interval: Duration,
        timeout: Duration,
        max_records_per_page: Option<usize>,
    ) -> Result<Vec<R>> {
        let mut rows = Vec::new();
        self.for_each_page(
            soql,
            include_deleted,
            poll_interval,
            timeout,
            max_records_per_page,
            |page: ResultPage<R>| {
                rows.extend(page.rows);
                Ok(())
            },
        )
        .await?;
        Ok(rows)
    }

    /// Run `soql` and hand each page to `on_page` as it arrives.
    ///
    /// Returns the completed job. An error from `on_page` stops paging and
    /// is returned unchanged.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, soql, on_page))]
    pub async fn for_each_page<R, F>(
        &self,
        soql: &str,
        include_deleted: bool,
        poll_interval: Duration,
        timeout: Duration,
        max_records_per_page: Option<usize>,
        mut on_page: F,
    ) -> Result<Job>
    where
        R: DeserializeOwned,
        F: FnMut(ResultPage<R>) -> Result<()>,
    {
        let spec = JobSpec::query(soql, include_deleted);
        let context = format!("{} {}", spec.operation, spec.target());

        let job = self.client.create(&spec).await.map_err(|e| e.with_context(&context))?;
        let job = Poller::new(self.client)
            .poll(&job.id, JobKind::Query, poll_interval, timeout)
            .await
            .map_err(|e| e.with_context(&context))?;

        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        let mut total = 0usize;
        loop {
            let page: ResultPage<R> = self
                .client
                .fetch_result_page_as(&job.id, cursor.as_deref(), max_records_per_page)
                .await
                .map_err(|e| e.with_context(&context))?;

            pages += 1;
            total += page.rows.len();
            let next = page.next_cursor.clone();
            debug!(page = pages, rows = page.rows.len(), "Received result page");
            on_page(page)?;

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(job_id = %job.id, pages, rows = total, "Query results retrieved");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_RECORDS_PER_PAGE;
    use crate::error::{Error, ErrorKind};
    use crate::testing::ScriptedTransport;
    use sf_bulkjobs_client::{RequestMethod, Response};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn query_job(state: &str) -> Response {
        Response::new(
            200,
            serde_json::json!({
                "id": "750Q",
                "state": state,
                "operation": "query",
                "object": "Account"
            })
            .to_string(),
        )
    }

    fn page(body: &str, locator: &str) -> Response {
        Response::new(200, body.to_string()).with_header("Sforce-Locator", locator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_are_concatenated_in_order() {
        let transport = ScriptedTransport::new();
        transport
            .push(query_job("UploadComplete"))
            .push(query_job("JobComplete"))
            .push(page("Id,Name\n001A,Acme\n001B,Globex\n", "Mg"))
            .push(page("Id,Name\n001C,Initech\n", "NA"))
            .push(page("Id,Name\n001D,Umbrella\n", "null"));

        let client = transport.job_client();
        let rows = QueryOrchestrator::new(&client)
            .run("SELECT Id, Name FROM Account", false, ms(100), Duration::from_secs(10), Some(2))
            .await
            .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r["Id"].as_str()).collect();
        assert_eq!(ids, vec!["001A", "001B", "001C", "001D"]);

        let fetches: Vec<_> = transport.requests().into_iter().skip(2).collect();
        assert_eq!(fetches.len(), 3);
        assert!(fetches.iter().all(|r| r.url.ends_with("/jobs/query/750Q/results")));
        assert!(fetches.iter().all(|r| r.query_param("maxRecords") == Some("2")));
        let locators: Vec<_> = fetches.iter().map(|r| r.query_param("locator")).collect();
        assert_eq!(locators, vec![None, Some("Mg"), Some("NA")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_query_never_pages() {
        let transport = ScriptedTransport::new();
        transport.push(query_job("UploadComplete")).push(Response::new(
            200,
            serde_json::json!({
                "id": "750Q",
                "state": "Failed",
                "operation": "query",
                "errorMessage": "InvalidQuery"
            })
            .to_string(),
        ));

        let client = transport.job_client();
        let err = QueryOrchestrator::new(&client)
            .run("SELECT Nope FROM Account", false, ms(100), Duration::from_secs(10), None)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::JobFailed { ref message, .. } if message == "InvalidQuery"));
        assert_eq!(err.context.as_deref(), Some("query Account"));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(transport.count(RequestMethod::Patch), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_all_and_empty_results() {
        let transport = ScriptedTransport::new();
        transport
            .push(query_job("UploadComplete"))
            .push(query_job("JobComplete"))
            .push(Response::new(200, ""));

        let client = transport.job_client();
        let rows = QueryOrchestrator::new(&client)
            .run("SELECT Id FROM Account", true, ms(100), Duration::from_secs(10), None)
            .await
            .unwrap();

        assert!(rows.is_empty());
        let requests = transport.requests();
        let create: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(create["operation"], "queryAll");
        assert_eq!(requests[2].query_param("maxRecords"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_page_size_is_sent_when_requested() {
        let transport = ScriptedTransport::new();
        transport
            .push(query_job("UploadComplete"))
            .push(query_job("JobComplete"))
            .push(page("Id\n001A\n", "null"));

        let client = transport.job_client();
        QueryOrchestrator::new(&client)
            .run(
                "SELECT Id FROM Account",
                false,
                ms(100),
                Duration::from_secs(10),
                Some(DEFAULT_MAX_RECORDS_PER_PAGE),
            )
            .await
            .unwrap();

        assert_eq!(transport.requests()[2].query_param("maxRecords"), Some("50000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_query_is_reported_without_paging() {
        let transport = ScriptedTransport::new();
        transport
            .push(query_job("UploadComplete"))
            .push(query_job("Aborted"));

        let client = transport.job_client();
        let err = QueryOrchestrator::new(&client)
            .run("SELECT Id FROM Account", false, ms(100), Duration::from_secs(10), None)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::JobAborted { ref job_id } if job_id == "750Q"));
        assert_eq!(err.context.as_deref(), Some("query Account"));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(transport.count(RequestMethod::Get), 1);
        assert_eq!(transport.count(RequestMethod::Patch), 0);
        assert!(!transport.requests().iter().any(|r| r.url.ends_with("/results")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_timeout_is_reported_without_abort() {
        let transport = ScriptedTransport::new();
        transport.push(query_job("UploadComplete"));
        transport.always(query_job("InProgress"));

        let client = transport.job_client();
        let err = QueryOrchestrator::new(&client)
            .run("SELECT Id FROM Account", false, ms(500), Duration::from_secs(3), None)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(
            err.kind,
            ErrorKind::JobTimeout { last_state: crate::types::JobState::InProgress, .. }
        ));
        assert_eq!(err.context.as_deref(), Some("query Account"));
        assert_eq!(transport.count(RequestMethod::Patch), 0);
        assert_eq!(transport.count(RequestMethod::Delete), 0);
        assert!(!transport.requests().iter().any(|r| r.url.ends_with("/results")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_typed() {
        #[derive(serde::Deserialize)]
        struct Account {
            #[serde(rename = "Id")]
            id: String,
            #[serde(rename = "AnnualRevenue")]
            revenue: Option<f64>,
        }

        let transport = ScriptedTransport::new();
        transport
            .push(query_job("UploadComplete"))
            .push(query_job("JobComplete"))
            .push(page("Id,AnnualRevenue\n001A,1500.5\n001B,\n", "null"));

        let client = transport.job_client();
        let rows: Vec<Account> = QueryOrchestrator::new(&client)
            .run_typed("SELECT Id, AnnualRevenue FROM Account", false, ms(100), Duration::from_secs(10), None)
            .await
            .unwrap();

        assert_eq!(rows[0].id, "001A");
        assert_eq!(rows[0].revenue, Some(1500.5));
        assert_eq!(rows[1].revenue, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_for_each_page_stops_on_callback_error() {
        let transport = ScriptedTransport::new();
        transport
            .push(query_job("UploadComplete"))
            .push(query_job("JobComplete"))
            .push(page("Id\n001A\n", "Mg"))
            .push(page("Id\n001B\n", "null"));

        let client = transport.job_client();
        let mut seen = 0;
        let err = QueryOrchestrator::new(&client)
            .for_each_page(
                "SELECT Id FROM Account",
                false,
                ms(100),
                Duration::from_secs(10),
                None,
                |page: ResultPage<Record>| {
                    seen += page.rows.len();
                    Err(Error::new(ErrorKind::Csv("sink full".into())))
                },
            )
            .await
            .unwrap_err();

        assert_eq!(seen, 1);
        assert!(matches!(err.kind, ErrorKind::Csv(_)));
        assert_eq!(transport.requests().len(), 3);
    }
}
