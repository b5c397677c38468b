//! Error types for sf-bulk.
//!
//! Every failure that escapes an orchestrator carries the kind of failure
//! and, once it has passed through one, a context string naming the
//! operation and object ("insert Account").

use std::time::Duration;

use crate::types::JobState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{}{}", context_prefix(.context.as_deref()), .kind)]
pub struct Error {
    pub kind: ErrorKind,
    /// Operation and object the error happened under, if known.
    pub context: Option<String>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn context_prefix(context: Option<&str>) -> String {
    context.map(|c| format!("{c}: ")).unwrap_or_default()
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            context: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach "{operation} {object}" context. An existing context is kept.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if self.context.is_none() {
            self.context = Some(context.into());
        }
        self
    }

    /// HTTP status of a remote error.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.kind, ErrorKind::Remote { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::JobTimeout { .. })
    }

    pub fn is_job_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::JobFailed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.kind, ErrorKind::JobAborted { .. })
    }

    /// Job the error refers to, for job-level failures.
    pub fn job_id(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::JobCreation { job_id, .. }
            | ErrorKind::JobFailed { job_id, .. }
            | ErrorKind::JobAborted { job_id }
            | ErrorKind::JobTimeout { job_id, .. } => Some(job_id),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Remote { status: u16, url: String, body: String },

    /// The service created the job but not in a state that accepts data.
    #[error("Job {job_id} was created in state {state}")]
    JobCreation { job_id: String, state: JobState },

    /// The job reached `Failed`. Carries the service's error message.
    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Job {job_id} was aborted")]
    JobAborted { job_id: String },

    #[error("Job {job_id} did not finish within {timeout:?} (last state: {last_state})")]
    JobTimeout {
        job_id: String,
        last_state: JobState,
        timeout: Duration,
    },

    /// Rejected before anything was sent.
    #[error("Invalid job spec: {0}")]
    InvalidSpec(String),

    /// A link returned by the service points away from the session's instance.
    #[error("Refusing to follow {0}: not on the instance host")]
    ForeignUrl(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<sf_bulkjobs_client::Error> for Error {
    fn from(err: sf_bulkjobs_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.to_string()), err)
    }
}

impl From<sf_bulkjobs_auth::Error> for Error {
    fn from(err: sf_bulkjobs_auth::Error) -> Self {
        Error::with_source(ErrorKind::Auth(err.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}
