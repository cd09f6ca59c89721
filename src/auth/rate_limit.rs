//! Rate limiting for the admin login endpoint, keyed by client IP, to
//! slow brute-force attempts against the shared secret.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::errors::ServiceError;

#[derive(Clone, Debug)]
pub struct LoginRateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
    pub lockout_duration: Duration,
}

impl Default for LoginRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(60 * 5),
            lockout_duration: Duration::from_secs(60 * 15),
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    attempts: u32,
    first_attempt: Instant,
    locked_until: Option<Instant>,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            attempts: 0,
            first_attempt: Instant::now(),
            locked_until: None,
        }
    }

    fn is_locked(&self) -> bool {
        self.locked_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    fn remaining_lockout(&self) -> Duration {
        self.locked_until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    fn should_reset(&self, window: Duration) -> bool {
        Instant::now().duration_since(self.first_attempt) > window
    }
}

/// In-process login attempt limiter. Advisory: each process counts its
/// own attempts, which is sufficient for a single-instance deployment.
#[derive(Clone)]
pub struct LoginRateLimiter {
    config: LoginRateLimitConfig,
    limits: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

impl LoginRateLimiter {
    pub fn new(config: LoginRateLimitConfig) -> Self {
        Self {
            config,
            limits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one attempt for `key` and rejects once the budget is spent.
    pub async fn check(&self, key: &str) -> Result<(), ServiceError> {
        let mut limits = self.limits.lock().await;
        let entry = limits
            .entry(key.to_string())
            .or_insert_with(RateLimitEntry::new);

        if entry.is_locked() {
            return Err(ServiceError::RateLimited {
                retry_after_secs: entry.remaining_lockout().as_secs(),
            });
        }

        if entry.should_reset(self.config.window) {
            *entry = RateLimitEntry::new();
        }

        entry.attempts += 1;
        if entry.attempts > self.config.max_attempts {
            entry.locked_until = Some(Instant::now() + self.config.lockout_duration);
            return Err(ServiceError::RateLimited {
                retry_after_secs: self.config.lockout_duration.as_secs(),
            });
        }

        Ok(())
    }

    /// Resets the counter after a successful login.
    pub async fn record_success(&self, key: &str) {
        let mut limits = self.limits.lock().await;
        limits.remove(key);
    }

    /// Drops entries that aged out of twice the window.
    pub async fn cleanup(&self) {
        let mut limits = self.limits.lock().await;
        let window = self.config.window;
        limits.retain(|_, entry| !entry.should_reset(window * 2) || entry.is_locked());
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(LoginRateLimitConfig::default())
    }
}

/// Background task to clean up old rate limit entries
pub async fn cleanup_rate_limits(rate_limiter: Arc<LoginRateLimiter>) {
    loop {
        sleep(Duration::from_secs(60 * 60)).await;
        rate_limiter.cleanup().await;
    }
}
