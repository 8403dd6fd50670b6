//! Single-shot HTTP stream probing.
//!
//! A probe is one bounded GET against the stream URL, mapped to a
//! [`ProbeOutcome`]. The prober never touches the registry or metrics; the
//! scheduler consumes the returned value.

use std::time::{Duration, Instant};

use reqwest::StatusCode;

use crate::error::Result;
use crate::registry::{FailureReason, ProbeOutcome, StreamDefinition};

/// Issues bounded HTTP probes and classifies their outcomes.
///
/// The timeout is fixed at construction and enforced by the underlying
/// `reqwest` client, covering connect, TLS and response-header time.
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    /// Build a prober whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("streamwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Probe one stream endpoint.
    ///
    /// Classification:
    /// - HTTP 200 → success, message "OK"
    /// - any other status → `http_<status>`, message "HTTP <status>"
    /// - timeout elapsed → `timeout`
    /// - transport/DNS/connect failure → `connection_error`
    /// - request could not be built (malformed URL) → `request_error`, 0ms
    ///
    /// `response_time_ms` is wall-clock from request start to headers
    /// received (or failure), whole milliseconds.
    pub async fn probe(&self, definition: &StreamDefinition) -> ProbeOutcome {
        let started = Instant::now();

        let request = match self.client.get(definition.url.as_str()).build() {
            Ok(request) => request,
            Err(e) => {
                // The request never left the process, so no time is charged.
                return ProbeOutcome::failure(
                    &definition.id,
                    FailureReason::RequestError,
                    format!("Invalid request: {e}"),
                    0,
                );
            }
        };

        match self.client.execute(request).await {
            Ok(response) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                let status = response.status();
                if status == StatusCode::OK {
                    ProbeOutcome::success(&definition.id, elapsed_ms)
                } else {
                    ProbeOutcome::failure(
                        &definition.id,
                        FailureReason::HttpStatus(status.as_u16()),
                        format!("HTTP {}", status.as_u16()),
                        elapsed_ms,
                    )
                }
            }
            Err(e) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if e.is_timeout() {
                    ProbeOutcome::failure(
                        &definition.id,
                        FailureReason::Timeout,
                        format!("Request timed out after {}ms", self.timeout.as_millis()),
                        elapsed_ms,
                    )
                } else {
                    ProbeOutcome::failure(
                        &definition.id,
                        FailureReason::ConnectionError,
                        format!("Connection failed: {e}"),
                        elapsed_ms,
                    )
                }
            }
        }
    }
}
