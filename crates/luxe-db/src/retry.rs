//! Fixed-backoff retry for connectivity verification.
//!
//! After the pool is (re)opened the database may still be starting, or
//! replaying the tail of a restore. Verification is retried on a bounded,
//! fixed schedule before the handle is declared unreachable.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use luxe_config::DatabaseConfig;

/// Bounded retry schedule for connectivity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectSchedule {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for ConnectSchedule {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(2),
        }
    }
}

impl ConnectSchedule {
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            max_attempts: config.connect_attempts.max(1),
            delay: Duration::from_millis(config.connect_backoff_ms),
        }
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// On exhaustion returns the number of attempts made and the last error.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, (u32, E)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= max_attempts => return Err((attempt, error)),
                Err(error) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        %error,
                        "waiting for database"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
