//! Backoff Strategy (SPEC_FULL.md §4.6): exponential backoff with full
//! jitter, honoring an upstream `retry-after` hint when present.

const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// Compute the delay before the next retry attempt.
///
/// If `retry_after_secs` is present it takes precedence over the exponential
/// schedule, clamped to `[base_delay_ms, max_delay_ms]`. Otherwise the delay
/// is `min(max_delay, base_delay * 2^attempt)` with full jitter applied
/// (`* (0.5 + rand[0, 0.5])`).
pub fn compute_delay_ms(config: &BackoffConfig, attempt: u32, retry_after_secs: Option<u64>) -> u64 {
    if let Some(secs) = retry_after_secs {
        let ms = secs.saturating_mul(1000);
        return ms.clamp(config.base_delay_ms, config.max_delay_ms);
    }

    let exp = config.base_delay_ms.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX).max(1));
    // 2^attempt computed via checked_shl above; guard overflow by clamping before jitter.
    let capped = exp.min(config.max_delay_ms);
    let jitter = 0.5 + fastrand::f64() * 0.5;
    ((capped as f64) * jitter).round() as u64
}
