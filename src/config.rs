//! Runtime configuration (SPEC_FULL.md §10.4): defaults, overridable from a
//! TOML file. Mirrors the teacher's defaults-then-file layering, minus the
//! env-var layer, which is handled separately by `credentials`.

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::model::Strategy;
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level gateway configuration. Every field has a default so a bare
/// `GatewayConfig::default()` is immediately usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    pub default_strategy: Strategy,
    /// Token count above which a request is considered to need a
    /// large-context model (§4.1).
    pub large_context_token_threshold: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            default_strategy: Strategy::default(),
            large_context_token_threshold: 8_000,
        }
    }
}

impl GatewayConfig {
    /// Load from a TOML file, falling back to defaults for any field the
    /// file omits. Returns `Err` only if the file exists but fails to parse.
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
