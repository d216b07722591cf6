//! Capped retry with exponential backoff for remote lookups
use anyhow::{Context, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use taxalink_core::config::RemoteConfig;
use tracing::{debug, error, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier (typically 2.0)
    pub multiplier: f32,
    /// Add jitter to prevent thundering herd
    pub jitter: bool,
    /// Which errors trigger retry (None = all errors)
    pub retryable_errors: Option<Vec<String>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
            retryable_errors: None,
        }
    }
}

impl RetryPolicy {
    /// Transient transport and server-side failures only; rejected requests fail fast
    pub fn for_network() -> Self {
        Self {
            retryable_errors: Some(vec![
                "connection".to_string(),
                "timeout".to_string(),
                "server error".to_string(),
                "rate limited".to_string(),
            ]),
            ..Self::default()
        }
    }

    /// Network policy with the attempt and backoff limits from `[remote]`
    pub fn from_config(config: &RemoteConfig) -> Self {
        RetryPolicyBuilder::from(Self::for_network())
            .max_attempts(config.max_attempts)
            .initial_backoff(Duration::from_millis(config.initial_backoff_ms))
            .max_backoff(Duration::from_millis(config.max_backoff_ms))
            .build()
    }

    /// Check if an error is retryable based on policy
    fn is_retryable(&self, error: &anyhow::Error) -> bool {
        if let Some(ref retryable) = self.retryable_errors {
            let error_str = format!("{:?}", error).to_lowercase();
            retryable.iter().any(|pattern| error_str.contains(pattern))
        } else {
            true
        }
    }

    /// Calculate backoff duration for attempt number
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let mut backoff = self.initial_backoff.as_millis() as f32;

        for _ in 0..attempt {
            backoff *= self.multiplier;
        }

        let mut duration =
            Duration::from_millis(backoff.min(self.max_backoff.as_millis() as f32) as u64);

        if self.jitter {
            let mut rng = rand::thread_rng();
            let jitter_ms = rng.gen_range(0..=(duration.as_millis() / 4) as u32);
            duration += Duration::from_millis(jitter_ms as u64);
        }

        duration
    }
}

/// Execute an async operation with retry logic
pub async fn with_retry_async<F, Fut, T>(
    mut operation: F,
    policy: &RetryPolicy,
    context: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", context, attempt);
                }
                return Ok(result);
            }
            Err(err) => {
                if !policy.is_retryable(&err) {
                    error!("Non-retryable error in {}: {:#}", context, err);
                    return Err(err);
                }

                if attempt < attempts - 1 {
                    let backoff = policy.calculate_backoff(attempt);
                    warn!(
                        "Attempt {}/{} failed for {}: {:#}. Retrying in {:?}",
                        attempt + 1,
                        attempts,
                        context,
                        err,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                } else {
                    error!("All {} attempts failed for {}: {:#}", attempts, context, err);
                }

                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Retry failed")))
        .context(format!("Failed after {} attempts: {}", attempts, context))
}

/// Builder for retry policies
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl From<RetryPolicy> for RetryPolicyBuilder {
    fn from(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    pub fn initial_backoff(mut self, duration: Duration) -> Self {
        self.policy.initial_backoff = duration;
        self
    }

    pub fn max_backoff(mut self, duration: Duration) -> Self {
        self.policy.max_backoff = duration;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.policy.jitter = jitter;
        self
    }

    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
