//! In-memory transport for tests that need control over time.
//!
//! wiremock needs real sockets, which do not mix with a paused tokio clock.
//! `ScriptedTransport` answers from a queue and records when each request
//! arrived on the tokio clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sf_bulkjobs_client::{
    ErrorKind as ClientErrorKind, HttpTransport, RequestBody, RequestBuilder, RequestMethod,
    Response, SalesforceClient,
};
use tokio::time::Instant;

use crate::client::JobClient;

pub(crate) const INSTANCE_URL: &str = "https://test.my.salesforce.com";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: RequestMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub at: Instant,
}

#[derive(Default)]
struct Script {
    queue: VecDeque<Response>,
    fallback: Option<Response>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next unanswered request with `response`.
    pub fn push(&self, response: Response) -> &Self {
        self.script.lock().unwrap().queue.push_back(response);
        self
    }

    /// Answer with `response` once the queue is drained.
    pub fn always(&self, response: Response) -> &Self {
        self.script.lock().unwrap().fallback = Some(response);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: RequestMethod) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    pub fn job_client(&self) -> JobClient<ScriptedTransport> {
        let session = SalesforceClient::with_transport(self.clone(), INSTANCE_URL, "token")
            .expect("valid test instance URL");
        JobClient::new(session)
    }
}

impl RecordedRequest {
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: RequestBuilder) -> sf_bulkjobs_client::Result<Response> {
        let body = request.body().map(|b| match b {
            RequestBody::Json(v) => v.to_string(),
            RequestBody::Text(t) => t.clone(),
            RequestBody::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        });

        let mut script = self.script.lock().unwrap();
        script.requests.push(RecordedRequest {
            method: request.method(),
            url: request.url().to_string(),
            query: request.query_params().to_vec(),
            body,
            at: Instant::now(),
        });

        script
            .queue
            .pop_front()
            .or_else(|| script.fallback.clone())
            .ok_or_else(|| {
                sf_bulkjobs_client::Error::new(ClientErrorKind::Other(format!(
                    "no scripted response for {} {}",
                    request.method(),
                    request.url()
                )))
            })
    }
}

/// JSON job status body.
pub(crate) fn job_json(id: &str, state: &str) -> String {
    serde_json::json!({
        "id": id,
        "state": state,
        "operation": "insert",
        "object": "Account",
        "numberRecordsProcessed": 0,
        "numberRecordsFailed": 0
    })
    .to_string()
}

pub(crate) fn job_response(id: &str, state: &str) -> Response {
    Response::new(200, job_json(id, state))
}
