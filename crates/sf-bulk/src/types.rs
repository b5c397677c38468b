//! Types for Bulk API 2.0 jobs.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// One CSV row keyed by column header, in column order.
pub type Record = IndexMap<String, String>;

/// Cursor value the service sends when there are no more pages.
pub(crate) const NO_MORE_PAGES: &str = "null";

/// Deserialize API version that can be either a float (59.0) or string ("59.0").
pub(crate) fn deserialize_api_version<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Bulk API 2.0 job states.
///
/// The remote service owns the state. Local code only observes it; nothing
/// here models which transitions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    /// Job is open and accepting data
    Open,
    /// Upload is complete, job is ready for processing
    UploadComplete,
    /// Job is processing
    InProgress,
    /// Job was aborted
    Aborted,
    /// Job completed successfully
    JobComplete,
    /// Job failed
    Failed,
    /// A state this client does not know about. Treated as non-terminal.
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Check if job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Aborted | JobState::JobComplete | JobState::Failed
        )
    }

    /// Check if job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobState::JobComplete)
    }

    /// Get the API string for this state.
    pub fn api_name(&self) -> &'static str {
        match self {
            JobState::Open => "Open",
            JobState::UploadComplete => "UploadComplete",
            JobState::InProgress => "InProgress",
            JobState::Aborted => "Aborted",
            JobState::JobComplete => "JobComplete",
            JobState::Failed => "Failed",
            JobState::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.api_name())
    }
}

/// Bulk API 2.0 operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    /// Insert new records
    Insert,
    /// Update existing records
    Update,
    /// Upsert based on external ID
    Upsert,
    /// Delete records (soft delete)
    Delete,
    /// Hard delete records (permanent)
    HardDelete,
    /// Query records
    Query,
    /// Query all records including deleted
    QueryAll,
}

impl BulkOperation {
    /// Get the API string for this operation.
    pub fn api_name(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Upsert => "upsert",
            BulkOperation::Delete => "delete",
            BulkOperation::HardDelete => "hardDelete",
            BulkOperation::Query => "query",
            BulkOperation::QueryAll => "queryAll",
        }
    }

    /// Check if this is a query operation.
    pub fn is_query(&self) -> bool {
        matches!(self, BulkOperation::Query | BulkOperation::QueryAll)
    }

    /// Check if this is an ingest operation.
    pub fn is_ingest(&self) -> bool {
        !self.is_query()
    }

    /// Which job collection this operation lives in.
    pub fn job_kind(&self) -> JobKind {
        if self.is_query() {
            JobKind::Query
        } else {
            JobKind::Ingest
        }
    }
}

impl std::fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.api_name())
    }
}

impl std::str::FromStr for BulkOperation {
    type Err = Error;

    /// Parse an API name such as `hardDelete`. Case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        const ALL: [BulkOperation; 7] = [
            BulkOperation::Insert,
            BulkOperation::Update,
            BulkOperation::Upsert,
            BulkOperation::Delete,
            BulkOperation::HardDelete,
            BulkOperation::Query,
            BulkOperation::QueryAll,
        ];
        ALL.into_iter()
            .find(|op| op.api_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::new(ErrorKind::InvalidSpec(format!("unknown operation '{s}'"))))
    }
}

/// The two job collections exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Ingest,
    Query,
}

impl JobKind {
    /// Path segment under `jobs/`.
    pub fn path(&self) -> &'static str {
        match self {
            JobKind::Ingest => "ingest",
            JobKind::Query => "query",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, JobKind::Query)
    }
}

/// Content type for Bulk API. Only CSV is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

/// Line ending style for Bulk API. Payloads and results use LF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    #[default]
    #[serde(rename = "LF")]
    Lf,
}

/// Column delimiter for Bulk API. Payloads and results use commas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnDelimiter {
    #[default]
    #[serde(rename = "COMMA")]
    Comma,
}

// =============================================================================
// Job specification
// =============================================================================

/// What to create: an ingest job against an object, or a query job.
///
/// The content format is fixed (CSV, LF line endings, comma delimiter) and
/// is not configurable per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub object: Option<String>,
    pub operation: BulkOperation,
    pub external_id_field: Option<String>,
    pub query: Option<String>,
}

impl JobSpec {
    /// Ingest job for `object`. Use [`JobSpec::upsert`] for upserts.
    pub fn ingest(object: impl Into<String>, operation: BulkOperation) -> Self {
        Self {
            object: Some(object.into()),
            operation,
            external_id_field: None,
            query: None,
        }
    }

    /// Upsert job keyed on `external_id_field`.
    pub fn upsert(object: impl Into<String>, external_id_field: impl Into<String>) -> Self {
        Self::ingest(object, BulkOperation::Upsert).with_external_id_field(external_id_field)
    }

    /// Query job. `include_deleted` selects `queryAll`.
    pub fn query(soql: impl Into<String>, include_deleted: bool) -> Self {
        Self {
            object: None,
            operation: if include_deleted {
                BulkOperation::QueryAll
            } else {
                BulkOperation::Query
            },
            external_id_field: None,
            query: Some(soql.into()),
        }
    }

    /// Set the external ID field for upsert operations.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = Some(field.into());
        self
    }

    pub fn kind(&self) -> JobKind {
        self.operation.job_kind()
    }

    /// Object name for log and error context.
    ///
    /// For query jobs this is the first object named after `FROM`.
    pub fn target(&self) -> &str {
        if let Some(object) = self.object.as_deref() {
            return object;
        }
        self.query
            .as_deref()
            .and_then(|soql| {
                let mut tokens = soql.split_whitespace();
                tokens.find(|t| t.eq_ignore_ascii_case("from"))?;
                tokens.next()
            })
            .map(|t| t.trim_end_matches([',', ')']))
            .filter(|t| !t.is_empty())
            .unwrap_or("query")
    }

    /// Reject malformed job definitions before anything is sent.
    pub fn validate(&self) -> Result<()> {
        use sf_bulkjobs_client::security::names::is_safe_api_name;

        let invalid = |msg: String| Err(Error::new(ErrorKind::InvalidSpec(msg)));

        if self.operation.is_query() {
            if self.query.as_deref().is_none_or(|q| q.trim().is_empty()) {
                return invalid(format!("{} requires a query", self.operation));
            }
            if self.external_id_field.is_some() {
                return invalid("query jobs do not take an external ID field".to_string());
            }
            return Ok(());
        }

        if self.query.is_some() {
            return invalid(format!("{} jobs do not take a query", self.operation));
        }
        match self.object.as_deref() {
            Some(object) if is_safe_api_name(object) => {}
            Some(object) => return invalid(format!("invalid object name '{object}'")),
            None => return invalid(format!("{} requires an object", self.operation)),
        }

        match (self.operation, self.external_id_field.as_deref()) {
            (BulkOperation::Upsert, None) => {
                invalid("upsert requires an external ID field".to_string())
            }
            (BulkOperation::Upsert, Some(field)) if field.trim().is_empty() => {
                invalid("upsert requires an external ID field".to_string())
            }
            (BulkOperation::Upsert, Some(field)) if !is_safe_api_name(field) => {
                invalid(format!("invalid external ID field '{field}'"))
            }
            (BulkOperation::Upsert, Some(_)) | (_, None) => Ok(()),
            (op, Some(_)) => invalid(format!("{op} does not take an external ID field")),
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Request to create an ingest job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    /// SObject API name
    pub object: String,
    /// Operation type
    pub operation: BulkOperation,
    /// External ID field for upsert
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    pub content_type: ContentType,
    pub column_delimiter: ColumnDelimiter,
    pub line_ending: LineEnding,
}

/// Request to create a query job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueryJobRequest {
    /// Operation type (query or queryAll)
    pub operation: BulkOperation,
    /// SOQL query
    pub query: String,
    pub column_delimiter: ColumnDelimiter,
    pub line_ending: LineEnding,
}

/// Request body for a job creation call, derived from a validated spec.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum CreateJobRequest {
    Ingest(CreateIngestJobRequest),
    Query(CreateQueryJobRequest),
}

impl CreateJobRequest {
    pub(crate) fn from_spec(spec: &JobSpec) -> Self {
        if spec.operation.is_query() {
            CreateJobRequest::Query(CreateQueryJobRequest {
                operation: spec.operation,
                query: spec.query.clone().unwrap_or_default(),
                column_delimiter: ColumnDelimiter::Comma,
                line_ending: LineEnding::Lf,
            })
        } else {
            CreateJobRequest::Ingest(CreateIngestJobRequest {
                object: spec.object.clone().unwrap_or_default(),
                operation: spec.operation,
                external_id_field_name: spec.external_id_field.clone(),
                content_type: ContentType::Csv,
                column_delimiter: ColumnDelimiter::Comma,
                line_ending: LineEnding::Lf,
            })
        }
    }
}

/// State transition requested by the client.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpdateJobStateRequest {
    pub state: JobState,
}

impl UpdateJobStateRequest {
    /// Signal that all data has been uploaded.
    pub fn upload_complete() -> Self {
        Self {
            state: JobState::UploadComplete,
        }
    }

    /// Ask the service to stop processing the job.
    pub fn abort() -> Self {
        Self {
            state: JobState::Aborted,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Job status as reported by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job ID
    pub id: String,
    /// Current state
    pub state: JobState,
    /// Operation type
    pub operation: BulkOperation,
    /// SObject API name (ingest jobs)
    #[serde(default)]
    pub object: Option<String>,
    /// Job creation time
    #[serde(default)]
    pub created_date: Option<String>,
    /// Number of records processed
    #[serde(default)]
    pub number_records_processed: i64,
    /// Number of records failed
    #[serde(default)]
    pub number_records_failed: i64,
    /// Error message if failed
    #[serde(default)]
    pub error_message: Option<String>,
    /// API version (can be float like 59.0 or string like "59.0")
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    /// Any other fields the service returned.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Job {
    /// Parsed creation timestamp, if the service sent one.
    ///
    /// Salesforce formats these as `2024-05-01T10:15:00.000+0000`.
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.created_date.as_deref()?;
        DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
    }
}

/// One page of the job list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobList {
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Job>,
    #[serde(default)]
    pub next_records_url: Option<String>,
}

fn default_done() -> bool {
    true
}

/// One page of query results.
///
/// Rows are [`Record`]s unless a typed row was requested.
#[derive(Debug, Clone)]
pub struct ResultPage<R = Record> {
    /// Parsed rows of this page.
    pub rows: Vec<R>,
    /// Opaque cursor for the next page, `None` on the last page.
    pub next_cursor: Option<String>,
}

impl<R> ResultPage<R> {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Cursor for the next page. Empty or the literal no-more token both mean
/// there is none; anything else is passed back byte for byte.
pub(crate) fn next_cursor(raw: Option<&str>) -> Option<String> {
    raw.filter(|c| !c.is_empty() && *c != NO_MORE_PAGES)
        .map(str::to_string)
}

/// Categorized outcome sets of a completed ingest job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCategory {
    /// Rows that were written, with `sf__Id` and `sf__Created`.
    Successful,
    /// Rows that were rejected, with `sf__Id` and `sf__Error`.
    Failed,
    /// Rows that were never attempted.
    Unprocessed,
}

impl ResultCategory {
    pub const ALL: [ResultCategory; 3] = [
        ResultCategory::Successful,
        ResultCategory::Failed,
        ResultCategory::Unprocessed,
    ];

    /// Path segment of the results resource.
    pub fn path(&self) -> &'static str {
        match self {
            ResultCategory::Successful => "successfulResults",
            ResultCategory::Failed => "failedResults",
            ResultCategory::Unprocessed => "unprocessedrecords",
        }
    }
}

impl std::fmt::Display for ResultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResultCategory::Successful => "successful",
            ResultCategory::Failed => "failed",
            ResultCategory::Unprocessed => "unprocessed",
        })
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Summary of a completed ingest job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub job_id: String,
    pub state: JobState,
    pub operation: BulkOperation,
    pub object: String,
    pub records_processed: i64,
    pub records_failed: i64,
}

impl IngestSummary {
    pub(crate) fn from_job(job: &Job, object: &str) -> Self {
        Self {
            job_id: job.id.clone(),
            state: job.state,
            operation: job.operation,
            object: job.object.clone().unwrap_or_else(|| object.to_string()),
            records_processed: job.number_records_processed,
            records_failed: job.number_records_failed,
        }
    }

    /// Fraction of processed records that did not fail.
    ///
    /// `numberRecordsProcessed` includes failed rows.
    pub fn success_rate(&self) -> f64 {
        if self.records_processed <= 0 {
            return 1.0;
        }
        let succeeded = (self.records_processed - self.records_failed).max(0);
        succeeded as f64 / self.records_processed as f64
    }

    /// Check if there were any failures.
    pub fn has_failures(&self) -> bool {
        self.records_failed > 0
    }
}

/// The three disjoint outcome sets of a completed ingest job.
#[derive(Debug, Clone, Default)]
pub struct IngestResults {
    pub successful: Vec<Record>,
    pub failed: Vec<Record>,
    pub unprocessed: Vec<Record>,
}

impl IngestResults {
    /// Ids assigned to successfully written rows.
    pub fn successful_ids(&self) -> Vec<&str> {
        self.successful
            .iter()
            .filter_map(|row| row.get("sf__Id").map(String::as_str))
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Number of successful rows that created a new record.
    pub fn created_count(&self) -> usize {
        self.successful
            .iter()
            .filter(|row| {
                row.get("sf__Created")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"))
            })
            .count()
    }

    /// Error text of each failed row, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter_map(|row| row.get("sf__Error").map(String::as_str))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len() + self.unprocessed.len()
    }
}

/// Summary plus the categorized rows of an ingest job.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub summary: IngestSummary,
    pub results: IngestResults,
}
