//! HttpTransport - generic single-request sender
//!
//! One attempt per call, fixed timeout, no retries. Failures are values, not
//! panics: callers pattern-match on the result and decide what to retain.

use std::time::Duration;

use thiserror::Error;

/// Fixed request timeout; the only bound on an in-flight send
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport-level failure
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint reachable but replied with a non-success status
    #[error("http status {code}")]
    Status { code: u16 },

    /// Connection, timeout, or protocol error
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Blocking-per-call HTTP sender shared by batch and announce requests
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the fixed timeout
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(TRANSPORT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Issue a single request: POST when a body is supplied, GET otherwise.
    ///
    /// Returns the raw response body on success.
    pub async fn send(&self, url: &str, body: Option<String>) -> Result<String, TransportError> {
        let response = match body {
            Some(body) => {
                self.client
                    .post(url)
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(body)
                    .send()
                    .await?
            }
            None => self.client.get(url).send().await?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
