//! Retry Handler (SPEC_FULL.md §4.6): wraps an opaque, fallible async
//! operation with error classification, capped exponential backoff, and
//! optional lifecycle hooks.

use crate::backoff::{compute_delay_ms, BackoffConfig};
use crate::circuit_breaker::CircuitBreaker;
use crate::errors::{GatewayError, GatewayResult};
use crate::rate_limit::RateLimitTracker;
use std::future::Future;
use tokio_util::sync::CancellationToken;

const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: BackoffConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: BackoffConfig::default(),
        }
    }
}

/// Lifecycle hooks for retry telemetry. All methods no-op by default so
/// callers only implement what they need (design note in SPEC_FULL.md §9).
pub trait RetryHooks: Send + Sync {
    fn on_retry(&self, _attempt: u32, _delay_ms: u64) {}
    fn on_success(&self, _attempts: u32) {}
    fn on_failure(&self, _attempts: u32, _error_history: &[String]) {}
}

#[derive(Default)]
pub struct NoopHooks;

impl RetryHooks for NoopHooks {}

/// Extract a `retry-after` hint (seconds) from a `GatewayError`, if any.
fn retry_after_secs(error: &GatewayError) -> Option<u64> {
    match error {
        GatewayError::RateLimited { retry_after } => *retry_after,
        _ => None,
    }
}

/// Binds a retry loop to the provider/model whose outcomes should feed the
/// Rate-Limit Tracker (§4.5): a 429 sets the cooldown the Tracker reads for
/// availability, a server/network error bumps the consecutive-error streak
/// behind the health score, and success clears it.
pub struct TrackedTarget<'a> {
    pub tracker: &'a RateLimitTracker,
    pub provider_type: &'a str,
    pub model: &'a str,
}

impl TrackedTarget<'_> {
    fn record_success(&self) {
        self.tracker.record_success(self.provider_type, self.model);
    }

    fn record_failure(&self, error: &GatewayError) {
        match error {
            GatewayError::RateLimited { retry_after } => {
                self.tracker.update_from_429(self.provider_type, self.model, *retry_after);
            }
            GatewayError::ServerError { .. } | GatewayError::NetworkError(_) => {
                self.tracker.record_error(self.provider_type, self.model);
            }
            _ => {}
        }
    }
}

/// Run `f` with retries. `f` is invoked with the current attempt index
/// (0-based) and must return a fresh future each call. When `target` is set,
/// every attempt's outcome is also recorded into its Rate-Limit Tracker.
///
/// `max_retries: 0` performs exactly one invocation.
pub async fn execute_with_retry<F, Fut, T>(
    mut f: F,
    config: &RetryConfig,
    hooks: &dyn RetryHooks,
    cancel: &CancellationToken,
    target: Option<&TrackedTarget<'_>>,
) -> GatewayResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let total_attempts = config.max_retries.max(1);
    let mut error_history: Vec<String> = Vec::new();

    for attempt in 0..total_attempts {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        match f(attempt).await {
            Ok(value) => {
                hooks.on_success(attempt + 1);
                if let Some(target) = target {
                    target.record_success();
                }
                return Ok(value);
            }
            Err(error) => {
                let retryable = error.is_retryable();
                let is_last_attempt = attempt + 1 == total_attempts;
                if let Some(target) = target {
                    target.record_failure(&error);
                }
                error_history.push(error.to_string());

                if !retryable || is_last_attempt {
                    let attempts = attempt + 1;
                    let message = format!("{error} after {attempts} attempts");
                    hooks.on_failure(attempts, &error_history);
                    return Err(GatewayError::RetryExhausted {
                        message,
                        attempts,
                        error_history,
                    });
                }

                let delay = compute_delay_ms(&config.backoff, attempt, retry_after_secs(&error));
                hooks.on_retry(attempt, delay);

                tokio::select! {
                    _ = tokio::time::sleep(tokio::time::Duration::from_millis(delay)) => {}
                    _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                }
            }
        }
    }

    unreachable!("loop always returns on success or exhaustion")
}

/// Gate `execute_with_retry` behind the Circuit Breaker (§4.3). The breaker
/// is checked once, before any attempt is made; a tripped circuit fails fast
/// with `CircuitOpen` instead of spending a single retry budget on it. The
/// breaker is updated once from the retry loop's final outcome, not per
/// attempt, since HALF_OPEN only tolerates one probe at a time.
pub async fn dispatch_with_circuit_breaker<F, Fut, T>(
    provider_id: &str,
    f: F,
    config: &RetryConfig,
    hooks: &dyn RetryHooks,
    cancel: &CancellationToken,
    target: Option<&TrackedTarget<'_>>,
    breaker: &CircuitBreaker,
) -> GatewayResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let check = breaker.check_circuit(provider_id);
    if !check.allowed {
        return Err(GatewayError::CircuitOpen {
            provider_id: provider_id.to_string(),
        });
    }

    let result = execute_with_retry(f, config, hooks, cancel, target).await;

    match &result {
        Ok(_) => breaker.record_success(provider_id),
        Err(_) => breaker.record_failure(provider_id),
    }

    result
}
