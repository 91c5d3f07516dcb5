//! Executes `HttpRequest`s against the network.
//!
//! # Design
//! `Transport` is the seam between the deterministic request builders and
//! real I/O. `UreqTransport` disables ureq's status-as-error behavior so 4xx
//! and 5xx responses come back as data for `decode`, and applies each
//! request's own timeout. When the timeout fires ureq drops the connection,
//! so nothing further is read from or written to the server for that call.

use std::io;

use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one request/response round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a pooled `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;
        debug!(method = method.as_str(), %url, timeout_ms = timeout.as_millis() as u64, "sending request");

        let result = match method {
            HttpMethod::Get => prepare(self.agent.get(url.as_str()), &headers, timeout).call(),
            HttpMethod::Delete => prepare(self.agent.delete(url.as_str()), &headers, timeout).call(),
            HttpMethod::Post => {
                let builder = prepare(self.agent.post(url.as_str()), &headers, timeout);
                match body {
                    Some(bytes) => builder.send(&bytes[..]),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| transport_error(&url, e))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport_error(&url, e))?;

        debug!(%url, status, "received response");
        Ok(HttpResponse { status, headers, body })
    }
}

fn prepare<B>(builder: RequestBuilder<B>, headers: &[(String, String)], timeout: std::time::Duration) -> RequestBuilder<B> {
    let builder = headers
        .iter()
        .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()));
    builder.config().timeout_global(Some(timeout)).build()
}

/// Split transport failures into timeouts and everything else.
fn transport_error(url: &str, error: ureq::Error) -> ApiError {
    let timed_out = match &error {
        ureq::Error::Timeout(_) => true,
        ureq::Error::Io(e) => e.kind() == io::ErrorKind::TimedOut,
        _ => false,
    };
    if timed_out {
        warn!(%url, "request timed out");
        ApiError::Timeout
    } else {
        warn!(%url, error = %error, "network error");
        ApiError::Network(error.to_string())
    }
}
