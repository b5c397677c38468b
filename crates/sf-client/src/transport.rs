//! The transport seam between job orchestration and the network.

use std::future::Future;

use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;

/// Sends a single HTTP request and returns the buffered response.
///
/// Implementations must not interpret the status code: a 4xx or 5xx is a
/// successful transport call that produced an unsuccessful response.
/// Only failures to obtain a response at all (connection refused, timeout,
/// unreadable body) are returned as `Err`.
pub trait HttpTransport: Send + Sync {
    /// Send the request once. No retries.
    fn send(&self, request: RequestBuilder) -> impl Future<Output = Result<Response>> + Send;
}
