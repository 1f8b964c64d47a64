//! Exponential-backoff retry policy for transport calls.
//!
//! Transient failures (network errors, timeouts, 429, 5xx) are retried with
//! exponential backoff; other 4xx client errors fail fast since repeating a
//! permanently-invalid request only burns the backoff budget.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::config::ApiConfig;

/// Configuration for retry behaviour.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the initial one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Randomize delays to avoid synchronized retries. Off by default so the
    /// backoff schedule stays deterministic (1s, 2s, 4s, ...).
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Derive retry behaviour from an API configuration, where
    /// `retry_attempts` counts retries after the initial attempt.
    pub fn from_api_config(api: &ApiConfig) -> Self {
        Self {
            max_attempts: api.retry_attempts + 1,
            ..Default::default()
        }
    }

    /// No retries at all; useful for probes where failure is an answer.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Classification of transport failures into retry behaviour.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Connection-level failure (DNS, refused, reset).
    Network,
    /// Request or response timed out (transport-level or HTTP 408).
    Timeout,
    /// HTTP 429 Too Many Requests.
    RateLimited,
    /// HTTP 5xx.
    ServerError(u16),
    /// HTTP 4xx other than 408/429; retrying cannot help.
    ClientError(u16),
    Unknown,
}

impl RetryableError {
    pub fn should_retry(&self) -> bool {
        match self {
            RetryableError::Network => true,
            RetryableError::Timeout => true,
            RetryableError::RateLimited => true,
            RetryableError::ServerError(_) => true,
            RetryableError::ClientError(_) => false,
            RetryableError::Unknown => false,
        }
    }

    pub fn from_status_code(status: u16) -> Self {
        match status {
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() || error.is_request() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }
}

/// Executes operations with exponential backoff between attempts.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation`, retrying transient failures up to the configured
    /// attempt budget. The last observed error is returned once the budget
    /// is exhausted.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> anyhow::Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, reqwest::Error>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.config.max_attempts {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Request succeeded on attempt {}", attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let retryable = RetryableError::from_reqwest_error(&error).should_retry();

                    if !retryable || attempt == self.config.max_attempts {
                        warn!(
                            "Request failed permanently on attempt {}/{} (retryable: {}): {}",
                            attempt, self.config.max_attempts, retryable, error
                        );
                        return Err(error.into());
                    }

                    warn!("Request failed on attempt {} (will retry): {}", attempt, error);
                    last_error = Some(error);

                    let delay = self.calculate_delay(attempt);
                    debug!("Backing off {:?} before retry", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // Unreachable with max_attempts >= 1; kept for safety.
        Err(last_error
            .map(Into::into)
            .unwrap_or_else(|| anyhow::anyhow!("retry budget of zero attempts")))
    }

    /// Delay before the attempt following `attempt` (1-based), capped at
    /// `max_delay`: `base * multiplier^(attempt - 1)`.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64);
        if delay > self.config.max_delay {
            delay = self.config.max_delay;
        }

        if self.config.jitter {
            let factor = rand::thread_rng().gen_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * factor) as u64);
        }

        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retryable() {
        assert!(RetryableError::Network.should_retry());
        assert!(RetryableError::Timeout.should_retry());
        assert!(RetryableError::RateLimited.should_retry());
        assert!(RetryableError::ServerError(503).should_retry());
    }

    #[test]
    fn client_errors_fail_fast() {
        assert!(!RetryableError::ClientError(400).should_retry());
        assert!(!RetryableError::ClientError(401).should_retry());
        assert!(!RetryableError::ClientError(404).should_retry());
        assert!(!RetryableError::Unknown.should_retry());
    }

    #[test]
    fn status_codes_classify_correctly() {
        assert_eq!(RetryableError::from_status_code(408), RetryableError::Timeout);
        assert_eq!(RetryableError::from_status_code(429), RetryableError::RateLimited);
        assert_eq!(RetryableError::from_status_code(422), RetryableError::ClientError(422));
        assert_eq!(RetryableError::from_status_code(500), RetryableError::ServerError(500));
    }

    #[test]
    fn backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let policy = RetryPolicy::new(config);
        assert_eq!(policy.calculate_delay(5), Duration::from_secs(8));
        assert_eq!(policy.calculate_delay(9), Duration::from_secs(8));
    }

    #[test]
    fn retry_attempts_map_to_total_attempts() {
        let api = ApiConfig {
            retry_attempts: 3,
            ..Default::default()
        };
        assert_eq!(RetryConfig::from_api_config(&api).max_attempts, 4);

        let none = ApiConfig {
            retry_attempts: 0,
            ..Default::default()
        };
        assert_eq!(RetryConfig::from_api_config(&none).max_attempts, 1);
    }
}
