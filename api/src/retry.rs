use http::StatusCode;
use reqwest::{blocking::Response, header::RETRY_AFTER, Result};
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::thread::sleep;
use std::time::Duration;

/// Strategy to use if retrying.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RetryStrategy {
    /// The first request by the client will not be retried, but subsequent requests will.
    /// This allows fast failure if the client cannot reach the API endpoint at all, but
    /// helps to mitigate failure in long-running operations spanning multiple requests.
    Automatic,
    /// Always attempt to retry requests.
    Always,
}

/// Configuration for retrying rate limited, unavailable or timed out requests.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Strategy for when to retry
    pub strategy: RetryStrategy,
    /// Maximum number of retries to attempt.
    pub max_retry_count: u8,
    /// Amount of time to wait for first retry.
    pub base_wait: Duration,
    /// Amount of time to scale retry waits. The wait before retry N is an exponential backoff
    /// using the formula `wait = base_wait * backoff_factor ^ N`.
    pub backoff_factor: f64,
    /// Upper bound on a wait requested by the server through `Retry-After`.
    pub max_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Always,
            max_retry_count: 5,
            base_wait: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_wait: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Retrier {
    config: RetryConfig,
    is_first_request: AtomicBool,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            is_first_request: AtomicBool::new(true),
        }
    }

    // 429 is the platform's rate limit, 503 its maintenance window.
    fn should_retry(status: StatusCode) -> bool {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after(&self, response: &Response) -> Option<Duration> {
        let seconds = response
            .headers()
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;
        Some(Duration::from_secs(seconds).min(self.config.max_wait))
    }

    pub fn with_retries(&self, send_request: impl Fn() -> Result<Response>) -> Result<Response> {
        if self.is_first_request.swap(false, SeqCst)
            && self.config.strategy == RetryStrategy::Automatic
        {
            return send_request();
        }

        for i_retry in 0..self.config.max_retry_count {
            let backoff = {
                let wait_factor = self.config.backoff_factor.powi(i_retry.into());
                self.config.base_wait.mul_f64(wait_factor)
            };

            match send_request() {
                Ok(response) if Self::should_retry(response.status()) => {
                    let duration = self
                        .retry_after(&response)
                        .map_or(backoff, |requested| requested.max(backoff));
                    log::warn!(
                        "{} for {} - retrying after {:?}.",
                        response.status(),
                        response.url(),
                        duration
                    );
                    sleep(duration)
                }
                Err(error) if error.is_timeout() || error.is_connect() || error.is_request() => {
                    log::warn!("{} - retrying after {:?}.", error, backoff);
                    sleep(backoff)
                }
                // If anything else, just return it immediately
                result => return result,
            }
        }

        // On last retry don't handle the error, just propagate all errors.
        send_request()
    }
}

#[cfg(test)]
mod tests {
    use super::{Retrier, RetryConfig, RetryStrategy};
    use reqwest::blocking::{get, Client};
    use std::io::Write;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    fn config(strategy: RetryStrategy, max_retry_count: u8) -> RetryConfig {
        RetryConfig {
            strategy,
            max_retry_count,
            base_wait: Duration::from_secs(0),
            backoff_factor: 0.0,
            max_wait: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_always_retry() {
        let mut server = mockito::Server::new();
        let mut handler = Retrier::new(config(RetryStrategy::Always, 5));

        // Does not attempt to retry on success
        let ok = server.mock("GET", "/").expect(1).create();
        assert!(handler.with_retries(|| get(server.url())).unwrap().status() == 200);
        ok.assert();
        ok.remove();

        // Retries up to N times on rate limiting.
        for i_retry in 0..5 {
            let err = server
                .mock("GET", "/")
                .with_status(429)
                .expect((i_retry + 1).into())
                .create();
            handler.config.max_retry_count = i_retry;
            assert!(handler.with_retries(|| get(server.url())).unwrap().status() == 429);
            err.assert();
            err.remove();
        }
    }

    #[test]
    fn test_automatic_retry() {
        let mut server = mockito::Server::new();
        let handler = Retrier::new(config(RetryStrategy::Automatic, 3));

        // Does not attempt to retry on failure of first request
        let err = server.mock("GET", "/").with_status(503).expect(1).create();
        assert!(handler.with_retries(|| get(server.url())).unwrap().status() == 503);
        err.assert();
        err.remove();

        // Subsequent requests are retried.
        let err = server.mock("GET", "/").with_status(503).expect(4).create();
        assert!(handler.with_retries(|| get(server.url())).unwrap().status() == 503);
        err.assert();
    }

    #[test]
    fn test_does_not_retry_client_errors() {
        let mut server = mockito::Server::new();
        let handler = Retrier::new(config(RetryStrategy::Always, 5));

        let not_found = server.mock("GET", "/").with_status(404).expect(1).create();
        assert!(handler.with_retries(|| get(server.url())).unwrap().status() == 404);
        not_found.assert();
    }

    #[test]
    fn test_retry_after_header_is_honoured() {
        let mut server = mockito::Server::new();
        let handler = Retrier::new(config(RetryStrategy::Always, 1));

        let limited = server
            .mock("GET", "/")
            .with_status(429)
            .with_header("Retry-After", "1")
            .expect(2)
            .create();
        let started = Instant::now();
        assert!(handler.with_retries(|| get(server.url())).unwrap().status() == 429);
        assert!(started.elapsed() >= Duration::from_secs(1));
        limited.assert();
    }

    #[test]
    fn test_timeout_retry() {
        let mut server = mockito::Server::new();
        let handler = Retrier::new(config(RetryStrategy::Always, 1));

        // Should retry on the timeout
        let timeout = server
            .mock("GET", "/")
            .with_chunked_body(|writer| {
                sleep(Duration::from_secs_f64(0.2));
                writer.write_all(b"late")
            })
            .expect(2)
            .create();
        let client = Client::new();
        assert!(handler
            .with_retries(|| client
                .get(server.url())
                .timeout(Duration::from_secs_f64(0.1))
                .send()
                .and_then(|r| {
                    // Reading the body forces the timeout
                    let _ = r.text()?;
                    unreachable!()
                }))
            .unwrap_err()
            .is_timeout());
        timeout.assert();
    }
}
