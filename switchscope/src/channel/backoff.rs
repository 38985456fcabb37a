//! Bounded retry primitive shared by connection setup and shell reads.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::warn;

/// A fixed number of attempts with a fixed pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,

    /// Pause between attempts. For reads this is how long each attempt
    /// waits for data.
    pub delay: Duration,
}

impl Backoff {
    /// Create a backoff policy.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Connection retry policy: five immediate attempts.
    pub const fn connect() -> Self {
        Self::new(5, Duration::ZERO)
    }

    /// Partial-line read policy: six polls, 100ms apart.
    pub const fn partial_read() -> Self {
        Self::new(6, Duration::from_millis(100))
    }

    /// Effective attempt count.
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Sleep for the configured delay.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Run `op` until it succeeds or the attempts run out, returning the
    /// last error. `op` receives the 1-based attempt number.
    pub async fn retry<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                    self.pause().await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::partial_read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_succeeds_on_last_attempt() {
        let backoff = Backoff::connect();
        let mut calls = 0;
        let result: Result<u32, String> = backoff
            .retry("connect", |attempt| {
                calls += 1;
                async move {
                    if attempt < 5 {
                        Err(format!("attempt {attempt}"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(5));
        assert_eq!(calls, 5);
    }

    #[tokio::test]
    async fn test_retry_returns_last_error() {
        let backoff = Backoff::new(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), String> = backoff
            .retry("connect", |attempt| {
                calls += 1;
                async move { Err(format!("attempt {attempt}")) }
            })
            .await;
        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let backoff = Backoff::new(0, Duration::ZERO);
        let result: Result<(), &str> = backoff.retry("noop", |_| async { Err("nope") }).await;
        assert_eq!(result, Err("nope"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_for_delay() {
        let backoff = Backoff::partial_read();
        let start = tokio::time::Instant::now();
        backoff.pause().await;
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }
}
