//! Load Balancer (SPEC_FULL.md §4.7): round-robins across equivalent provider
//! credentials, skipping ones the Rate-Limit Tracker marks unavailable.

use crate::model::ProviderCredential;
use crate::rate_limit::RateLimitTracker;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct LoadBalancer {
    cursors: Mutex<HashMap<String, usize>>,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self {
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// Pick one credential from `providers` round-robin, skipping any whose
    /// `(providerType, model)` the tracker reports unavailable. Returns
    /// `None` for an empty pool or when every credential is ineligible.
    pub fn distribute<'a>(
        &self,
        providers: &'a [ProviderCredential],
        model: &str,
        required_tokens: Option<u64>,
        tracker: Option<&RateLimitTracker>,
    ) -> Option<&'a ProviderCredential> {
        if providers.is_empty() {
            return None;
        }

        // Availability is checked per credential id: distinct credentials of the
        // same provider type (e.g. multiple API keys) have independent capacity,
        // even though they share a round-robin cursor keyed by provider type.
        let eligible: Vec<&ProviderCredential> = providers
            .iter()
            .filter(|c| match tracker {
                None => true,
                Some(t) => {
                    let tokens = required_tokens.unwrap_or(0);
                    t.can_make_request(&c.id, model, tokens)
                }
            })
            .collect();

        if eligible.is_empty() {
            return None;
        }

        let cursor_key = providers[0].provider_type.clone();
        let mut cursors = self.cursors.lock().expect("load balancer mutex poisoned");
        let cursor = cursors.entry(cursor_key).or_insert(0);
        let chosen = eligible[*cursor % eligible.len()];
        *cursor = (*cursor + 1) % eligible.len();
        Some(chosen)
    }

    pub fn reset(&self, key: &str) {
        let mut cursors = self.cursors.lock().expect("load balancer mutex poisoned");
        cursors.remove(key);
    }

    pub fn reset_all(&self) {
        let mut cursors = self.cursors.lock().expect("load balancer mutex poisoned");
        cursors.clear();
    }
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new()
    }
}
