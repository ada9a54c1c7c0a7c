//! Selector (SPEC_FULL.md §4.4): the strategy-driven pipeline that combines
//! the Analyzer, Categorizer, and Rate-Limit Tracker to pick one model.

use crate::analyzer::analyze;
use crate::categorizer::{effective_category, estimate_input_tokens, estimate_output_tokens, supports_context_window};
use crate::errors::{GatewayError, GatewayResult};
use crate::model::{Candidate, Catalog, CatalogModel, Message, ModelCategory, Preferences, SelectionResult, Strategy, ToolDefinition};
use crate::rate_limit::RateLimitTracker;
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_MODEL_FAMILY: &str = "";

pub struct SelectRequest<'a> {
    pub messages: &'a [Message],
    pub tools: Option<&'a [ToolDefinition]>,
    pub max_tokens: u64,
    pub catalog: &'a Catalog,
    pub preferences: Option<&'a Preferences>,
    pub tracker: Option<&'a RateLimitTracker>,
    pub round_robin: Option<&'a RoundRobinSelector>,
}

/// Round-robin state for the Selector, keyed by `category+strategy` (§4.4
/// step 8), distinct from the Load Balancer's provider-type cursors.
pub struct RoundRobinSelector {
    cursors: Mutex<HashMap<String, usize>>,
}

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self {
            cursors: Mutex::new(HashMap::new()),
        }
    }

    fn rotate(&self, key: &str, group_size: usize) -> usize {
        if group_size == 0 {
            return 0;
        }
        let mut cursors = self.cursors.lock().expect("selector round-robin mutex poisoned");
        let cursor = cursors.entry(key.to_string()).or_insert(0);
        let chosen = *cursor % group_size;
        *cursor = (*cursor + 1) % group_size;
        chosen
    }
}

impl Default for RoundRobinSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn recommend_category(requires_reasoning: bool, requires_large_context: bool) -> ModelCategory {
    if requires_reasoning {
        ModelCategory::Reasoning
    } else if requires_large_context {
        ModelCategory::Large
    } else {
        ModelCategory::Small
    }
}

/// Flatten the catalog into tagged candidates. Duplicate model names within
/// the same provider type keep only the first occurrence (open question in
/// SPEC_FULL.md §9: undocumented upstream behavior, treated as "first wins").
fn flatten_catalog(catalog: &Catalog) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (provider_type, models) in catalog {
        for model in &models.models {
            let dedup_key = (provider_type.clone(), model.name.clone());
            if seen.insert(dedup_key) {
                out.push(Candidate {
                    provider_type: provider_type.clone(),
                    model: model.clone(),
                });
            }
        }
    }
    out
}

fn avg_cost(model: &CatalogModel) -> f64 {
    (model.pricing.input + model.pricing.output) / 2.0
}

/// Apply the chosen strategy's ordering (§4.4 step 7) in place.
fn apply_strategy(strategy: Strategy, candidates: &mut Vec<Candidate>) -> GatewayResult<()> {
    match strategy {
        Strategy::FreeTier => {
            candidates.retain(|c| c.model.free);
            if candidates.is_empty() {
                return Err(GatewayError::CostConstraintUnmet);
            }
        }
        Strategy::CostOptimized => {
            candidates.sort_by(|a, b| avg_cost(&a.model).partial_cmp(&avg_cost(&b.model)).unwrap());
        }
        Strategy::QualityOptimized => {
            candidates.sort_by(|a, b| {
                b.model
                    .context_window
                    .cmp(&a.model.context_window)
                    .then_with(|| a.model.free.cmp(&b.model.free))
            });
        }
        Strategy::Balanced => {
            candidates.sort_by(|a, b| {
                b.model
                    .free
                    .cmp(&a.model.free)
                    .then_with(|| b.model.context_window.cmp(&a.model.context_window))
            });
        }
    }
    Ok(())
}

/// Size of the leading group of candidates tied on the strategy's primary
/// sort key, used to bound round-robin rotation to the top tier only.
fn top_tier_group_size(strategy: Strategy, candidates: &[Candidate]) -> usize {
    if candidates.is_empty() {
        return 0;
    }
    match strategy {
        Strategy::FreeTier => candidates.len(),
        Strategy::CostOptimized => {
            let first = avg_cost(&candidates[0].model);
            candidates.iter().take_while(|c| (avg_cost(&c.model) - first).abs() < f64::EPSILON).count()
        }
        Strategy::QualityOptimized | Strategy::Balanced => {
            let first = candidates[0].model.context_window;
            candidates.iter().take_while(|c| c.model.context_window == first).count()
        }
    }
}

fn fallback_categories(category: ModelCategory) -> &'static [ModelCategory] {
    match category {
        ModelCategory::Reasoning => &[ModelCategory::Large, ModelCategory::Small],
        ModelCategory::Large => &[ModelCategory::Reasoning, ModelCategory::Small],
        // Open question (SPEC_FULL.md §9): the source excludes REASONING here;
        // preserved as-is rather than guessed into symmetry.
        ModelCategory::Small => &[ModelCategory::Large],
    }
}

/// Run the Selector pipeline once for a forced category (used directly by
/// `select_model` and by `select_with_fallback`'s retry loop).
fn select_for_category(req: &SelectRequest, forced_category: Option<ModelCategory>) -> GatewayResult<SelectionResult> {
    if req.catalog.is_empty() {
        return Err(GatewayError::InvalidInput("catalog is empty".to_string()));
    }
    if req.messages.is_empty() {
        return Err(GatewayError::InvalidInput("messages is empty".to_string()));
    }

    let input_tokens = estimate_input_tokens(req.messages, req.tools, DEFAULT_MODEL_FAMILY);
    let analysis = analyze(req.messages, req.tools, input_tokens);
    let output_tokens = estimate_output_tokens(req.max_tokens, analysis.request_type);
    let total_tokens = input_tokens + output_tokens;

    let category = forced_category.unwrap_or_else(|| {
        recommend_category(analysis.requires_reasoning, analysis.requires_large_context)
    });

    let mut candidates: Vec<Candidate> = flatten_catalog(req.catalog)
        .into_iter()
        .filter(|c| effective_category(&c.model) == category)
        .collect();
    if candidates.is_empty() {
        return Err(GatewayError::NoCandidates {
            category: category.to_string(),
        });
    }

    let max_window = candidates.iter().map(|c| c.model.context_window).max().unwrap_or(0);
    candidates.retain(|c| supports_context_window(c.model.context_window, total_tokens));
    if candidates.is_empty() {
        return Err(GatewayError::ContextWindowExceeded {
            required: total_tokens,
            window: max_window,
        });
    }

    if let Some(tracker) = req.tracker {
        candidates.retain(|c| {
            let cap = tracker.get_capacity(&c.provider_type, &c.model.name);
            cap.available && cap.tokens.is_none_or(|t| t >= output_tokens)
        });
        if candidates.is_empty() {
            return Err(GatewayError::AllRateLimited);
        }
    }

    if let Some(prefs) = req.preferences {
        if let Some(max_cost) = prefs.max_cost_per_million {
            candidates.retain(|c| avg_cost(&c.model) <= max_cost);
            if candidates.is_empty() {
                return Err(GatewayError::CostConstraintUnmet);
            }
        }
    }

    let strategy = req.preferences.and_then(|p| p.strategy).unwrap_or_default();
    apply_strategy(strategy, &mut candidates)?;

    let candidate_count = candidates.len();
    let chosen_index = match req.round_robin {
        Some(rr) => {
            let group_size = top_tier_group_size(strategy, &candidates);
            let key = format!("{category}:{strategy:?}");
            rr.rotate(&key, group_size)
        }
        None => 0,
    };
    let chosen = &candidates[chosen_index];

    Ok(SelectionResult {
        model: chosen.model.name.clone(),
        provider_type: chosen.provider_type.clone(),
        category,
        analysis,
        candidate_count,
        input_tokens,
        output_tokens,
        total_tokens,
    })
}

pub fn select_model(req: &SelectRequest) -> GatewayResult<SelectionResult> {
    select_for_category(req, None)
}

/// Run `select_model`; on `AllRateLimited`/`NoCandidates` for the recommended
/// category, retry forcing each fallback category in turn until one succeeds
/// or all are exhausted (re-raising the last error).
pub fn select_with_fallback(req: &SelectRequest) -> GatewayResult<SelectionResult> {
    match select_for_category(req, None) {
        Ok(result) => Ok(result),
        Err(err @ (GatewayError::AllRateLimited | GatewayError::NoCandidates { .. })) => {
            let input_tokens = estimate_input_tokens(req.messages, req.tools, DEFAULT_MODEL_FAMILY);
            let analysis = analyze(req.messages, req.tools, input_tokens);
            let recommended = recommend_category(analysis.requires_reasoning, analysis.requires_large_context);

            let mut last_err = err;
            for &fallback in fallback_categories(recommended) {
                match select_for_category(req, Some(fallback)) {
                    Ok(result) => return Ok(result),
                    Err(e) => last_err = e,
                }
            }
            Err(last_err)
        }
        Err(other) => Err(other),
    }
}

/// Run `select_with_fallback` over many requests; a per-request failure is
/// reported rather than aborting the batch. All requests share `round_robin`
/// so load distributes across the batch.
pub fn batch_select(reqs: &[SelectRequest]) -> Vec<Result<SelectionResult, GatewayError>> {
    reqs.iter().map(select_with_fallback).collect()
}
