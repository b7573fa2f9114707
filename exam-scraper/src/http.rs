use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::retry::{ErrorKind, RetryDecision, RetryPolicy};

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Anything that can GET a URL. `HttpClient` is the real one.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Blocking client shared by every request of a run.
///
/// The underlying connection pool is released when the client is dropped.
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

/// Outcome of a single attempt, before the retry policy is consulted.
enum Attempt {
    Done(HttpResponse),
    Failed {
        kind: ErrorKind,
        retry_after: Option<Duration>,
        error: FetchError,
    },
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send() {
            Ok(response) => response,
            Err(e) => return transport_failure(url, e),
        };

        let status = response.status();
        if !status.is_success() {
            return Attempt::Failed {
                kind: ErrorKind::Status(status.as_u16()),
                retry_after: retry_after(response.headers()),
                error: FetchError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                },
            };
        }

        let headers = response.headers().clone();
        match response.bytes() {
            Ok(body) => Attempt::Done(HttpResponse {
                status,
                body: body.to_vec(),
                headers,
            }),
            Err(e) => transport_failure(url, e),
        }
    }
}

impl Fetch for HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let mut attempt = 1u32;
        loop {
            match self.attempt(url) {
                Attempt::Done(response) => return Ok(response),
                Attempt::Failed {
                    kind,
                    retry_after,
                    error,
                } => match self.retry.decide(attempt, kind, retry_after) {
                    RetryDecision::NoRetry => return Err(error),
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            "Retrying {} in {:.1}s (attempt {} failed: {})",
                            url,
                            delay.as_secs_f64(),
                            attempt,
                            error
                        );
                        thread::sleep(delay);
                        attempt += 1;
                    }
                },
            }
        }
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        debug!("HTTP session closed");
    }
}

fn transport_failure(url: &str, e: reqwest::Error) -> Attempt {
    let url = url.to_string();
    if e.is_timeout() {
        return Attempt::Failed {
            kind: ErrorKind::Timeout,
            retry_after: None,
            error: FetchError::Timeout { url },
        };
    }
    let kind = if e.is_connect() || e.is_request() || e.is_body() {
        ErrorKind::Connection
    } else {
        ErrorKind::Other
    };
    Attempt::Failed {
        kind,
        retry_after: None,
        error: FetchError::Network { url, source: e },
    }
}

/// Numeric `Retry-After` header, in seconds. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
