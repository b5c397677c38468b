//! Waiting for a job to reach a terminal state.
//!
//! The poller sleeps once for the configured interval before the first
//! status check, then checks repeatedly with a delay that doubles each
//! cycle up to [`MAX_POLL_DELAY`]. The timeout is measured on the tokio
//! clock from the moment `poll` is called.
//!
//! A poll is not preemptible mid-sleep. To give up early, wrap the future
//! in `tokio::time::timeout` or `tokio::select!`; the remote job keeps
//! running and should be aborted explicitly.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, instrument, warn};

use sf_bulkjobs_client::HttpTransport;

use crate::client::JobClient;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{Job, JobKind, JobState};

/// Upper bound for the delay between two status checks.
pub const MAX_POLL_DELAY: Duration = Duration::from_secs(2);

/// Delay to use after `current`: doubled, capped at [`MAX_POLL_DELAY`].
pub fn next_delay(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_POLL_DELAY)
}

/// Polls job status until the job finishes, fails, or the timeout passes.
#[derive(Debug)]
pub struct Poller<'a, T> {
    client: &'a JobClient<T>,
}

impl<'a, T: HttpTransport> Poller<'a, T> {
    pub fn new(client: &'a JobClient<T>) -> Self {
        Self { client }
    }

    /// Wait for `job_id` to reach `JobComplete`.
    ///
    /// `Failed` and `Aborted` are errors, as is running past `timeout`.
    /// Status check failures propagate immediately.
    #[instrument(skip(self))]
    pub async fn poll(
        &self,
        job_id: &str,
        kind: JobKind,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<Job> {
        let start = Instant::now();
        sleep(poll_interval).await;

        let mut delay = poll_interval.min(MAX_POLL_DELAY);
        loop {
            let job = self.client.get_status(job_id, kind).await?;

            match job.state {
                JobState::JobComplete => return Ok(job),
                JobState::Failed => {
                    let message = match job.error_message.as_deref() {
                        Some(message) if !message.is_empty() => message.to_string(),
                        _ => serde_json::to_string(&job)?,
                    };
                    return Err(Error::new(ErrorKind::JobFailed {
                        job_id: job.id,
                        message,
                    }));
                }
                JobState::Aborted => {
                    return Err(Error::new(ErrorKind::JobAborted { job_id: job.id }));
                }
                state => {
                    let elapsed = start.elapsed();
                    if elapsed > timeout {
                        warn!(%state, ?elapsed, ?timeout, "Job did not finish in time");
                        return Err(Error::new(ErrorKind::JobTimeout {
                            job_id: job.id,
                            last_state: state,
                            timeout,
                        }));
                    }
                    debug!(%state, ?delay, "Job still running");
                }
            }

            sleep(delay).await;
            delay = next_delay(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{job_response, ScriptedTransport};
    use sf_bulkjobs_client::{RequestMethod, Response};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn gaps(transport: &ScriptedTransport, start: Instant) -> Vec<Duration> {
        let mut last = start;
        transport
            .requests()
            .iter()
            .map(|r| {
                let gap = r.at - last;
                last = r.at;
                gap
            })
            .collect()
    }

    #[test]
    fn test_next_delay_doubles_and_caps() {
        assert_eq!(next_delay(ms(100)), ms(200));
        assert_eq!(next_delay(ms(800)), ms(1600));
        assert_eq!(next_delay(ms(1600)), MAX_POLL_DELAY);
        assert_eq!(next_delay(MAX_POLL_DELAY), MAX_POLL_DELAY);
        assert_eq!(next_delay(Duration::from_secs(30)), MAX_POLL_DELAY);
        assert_eq!(next_delay(Duration::ZERO), Duration::ZERO);
        assert_eq!(next_delay(Duration::MAX), MAX_POLL_DELAY);
    }

    #[test]
    fn test_next_delay_sequence_is_increasing_until_cap() {
        let mut delay = ms(50);
        let mut seen = vec![delay];
        for _ in 0..10 {
            delay = next_delay(delay);
            seen.push(delay);
        }
        assert!(seen.iter().all(|d| *d <= MAX_POLL_DELAY));
        assert!(seen.windows(2).all(|w| w[1] > w[0] || w[1] == MAX_POLL_DELAY));
        assert_eq!(*seen.last().unwrap(), MAX_POLL_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_backoff_schedule() {
        let transport = ScriptedTransport::new();
        for _ in 0..6 {
            transport.push(job_response("750A", "InProgress"));
        }
        transport.push(job_response("750A", "JobComplete"));

        let client = transport.job_client();
        let start = Instant::now();
        let job = Poller::new(&client)
            .poll("750A", JobKind::Ingest, ms(500), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(job.state, JobState::JobComplete);
        assert_eq!(
            gaps(&transport, start),
            vec![ms(500), ms(500), ms(1000), ms(2000), ms(2000), ms(2000), ms(2000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failed_carries_error_message() {
        let transport = ScriptedTransport::new();
        transport.push(Response::new(
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
        let err = Poller::new(&client)
            .poll("750Q", JobKind::Query, ms(100), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(err.is_job_failed());
        assert!(matches!(err.kind, ErrorKind::JobFailed { ref message, .. } if message == "InvalidQuery"));
        assert!(transport.requests()[0].url.ends_with("/jobs/query/750Q"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failed_without_message_carries_payload() {
        let transport = ScriptedTransport::new();
        transport.push(job_response("750A", "Failed"));

        let client = transport.job_client();
        let err = Poller::new(&client)
            .poll("750A", JobKind::Ingest, ms(100), Duration::from_secs(5))
            .await
            .unwrap_err();

        match err.kind {
            ErrorKind::JobFailed { message, .. } => {
                assert!(message.contains("\"state\":\"Failed\""));
                assert!(message.contains("750A"));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_aborted() {
        let transport = ScriptedTransport::new();
        transport.push(job_response("750A", "InProgress"));
        transport.push(job_response("750A", "Aborted"));

        let client = transport.job_client();
        let err = Poller::new(&client)
            .poll("750A", JobKind::Ingest, ms(100), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::JobAborted { ref job_id } if job_id == "750A"));
        assert_eq!(transport.count(RequestMethod::Get), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_stops_polling() {
        let transport = ScriptedTransport::new();
        transport.always(job_response("750A", "InProgress"));

        let client = transport.job_client();
        let start = Instant::now();
        let err = Poller::new(&client)
            .poll("750A", JobKind::Ingest, ms(500), Duration::from_secs(3))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(
            err.kind,
            ErrorKind::JobTimeout { last_state: JobState::InProgress, .. }
        ));

        // Checks at 0.5s, 1.0s, 2.0s and 4.0s; the last one is past the timeout.
        assert_eq!(transport.requests().len(), 4);
        assert_eq!(Instant::now() - start, Duration::from_secs(4));

        // Nothing else is sent after the timeout is reported.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_unknown_state_keeps_polling() {
        let transport = ScriptedTransport::new();
        transport.push(job_response("750A", "Queued"));
        transport.push(job_response("750A", "JobComplete"));

        let client = transport.job_client();
        let job = Poller::new(&client)
            .poll("750A", JobKind::Ingest, ms(10), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(job.state, JobState::JobComplete);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_status_error_propagates() {
        let transport = ScriptedTransport::new();
        transport.push(Response::new(500, "upstream unavailable"));

        let client = transport.job_client();
        let err = Poller::new(&client)
            .poll("750A", JobKind::Ingest, ms(10), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.requests().len(), 1);
    }
}
