//! Environment-variable credential loader (SPEC_FULL.md §10.4).
//!
//! Scans `LP_TYPE_{i}` / `LP_KEY_{i}` / `LP_ENDPOINT_{i}` / `LP_MODEL_{i}` /
//! `LP_PRIORITY_{i}` for increasing `i` starting at 0. Gaps are allowed: a
//! missing index is skipped, not a stopping condition. An index is valid only
//! if both `TYPE` and `KEY` are present and non-empty after trimming.
//! Scanning stops once `MAX_INDEX` consecutive misses have been seen, to
//! avoid an unbounded loop over a sparse or empty environment.

use crate::model::{CredentialSource, ProviderCredential};

const MAX_INDEX: usize = 64;
const MAX_CONSECUTIVE_MISSES: usize = 8;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load all well-formed credentials from the process environment.
pub fn load_from_env() -> Vec<ProviderCredential> {
    let mut credentials = Vec::new();
    let mut consecutive_misses = 0;

    for i in 0..MAX_INDEX {
        let provider_type = env_var(&format!("LP_TYPE_{i}"));
        let api_key = env_var(&format!("LP_KEY_{i}"));

        match (provider_type, api_key) {
            (Some(provider_type), Some(api_key)) => {
                consecutive_misses = 0;
                let api_endpoint = env_var(&format!("LP_ENDPOINT_{i}"));
                let model_name = env_var(&format!("LP_MODEL_{i}"));
                let priority = std::env::var(format!("LP_PRIORITY_{i}"))
                    .ok()
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .unwrap_or(100);

                credentials.push(ProviderCredential {
                    id: format!("{}-{i}", provider_type.trim()),
                    provider_type: provider_type.trim().to_string(),
                    api_key,
                    api_endpoint,
                    model_name,
                    priority,
                    source: CredentialSource::Environment,
                });
                tracing::debug!(index = i, provider_type = %credentials.last().unwrap().provider_type, "loaded credential from environment");
            }
            _ => {
                consecutive_misses += 1;
                if consecutive_misses >= MAX_CONSECUTIVE_MISSES {
                    break;
                }
            }
        }
    }

    credentials
}
