//! Categorizer & Token Calculator (SPEC_FULL.md §4.2): maps a model name to a
//! coarse category and estimates input/output token counts per model family.

use crate::model::{CatalogModel, Message, ModelCategory, RequestType, ToolDefinition};

const SAFETY_MARGIN: f64 = 1.2;

const REASONING_SUBSTRINGS: &[&str] = &["o1", "deepseek-reasoner", "qwq"];
const LARGE_SUBSTRINGS: &[&str] = &["70b", "405b", "8x22b", "opus", "pro", "72b"];

/// Categorize a model name by case-insensitive substring heuristics (§4.2).
/// An explicit catalog `category` override always wins; call this only when
/// one isn't supplied.
pub fn categorize_model_name(name: &str) -> ModelCategory {
    let lower = name.to_lowercase();

    if REASONING_SUBSTRINGS.iter().any(|s| lower.contains(s)) {
        return ModelCategory::Reasoning;
    }

    let is_large = LARGE_SUBSTRINGS.iter().any(|s| lower.contains(s))
        || (lower.contains("gpt-4") && !lower.contains("mini") && !lower.contains("turbo-preview"));

    if is_large {
        ModelCategory::Large
    } else {
        ModelCategory::Small
    }
}

/// Resolve a catalog model's effective category: explicit override, else
/// name heuristics.
pub fn effective_category(model: &CatalogModel) -> ModelCategory {
    model.category.unwrap_or_else(|| categorize_model_name(&model.name))
}

struct FamilyProfile {
    chars_per_token: f64,
    per_message_overhead: u64,
}

const DEFAULT_PROFILE: FamilyProfile = FamilyProfile {
    chars_per_token: 4.0,
    per_message_overhead: 4,
};

/// Pick the token-estimation profile for a model family by substring match on
/// the model name. Order matters only in that unrelated families don't
/// collide; these substrings are mutually exclusive in practice.
fn family_profile(model_name: &str) -> FamilyProfile {
    let lower = model_name.to_lowercase();
    if lower.contains("gpt-4") {
        FamilyProfile {
            chars_per_token: 4.0,
            per_message_overhead: 3,
        }
    } else if lower.contains("gpt-3.5") {
        FamilyProfile {
            chars_per_token: 4.0,
            per_message_overhead: 3,
        }
    } else if lower.contains("llama") {
        FamilyProfile {
            chars_per_token: 3.5,
            per_message_overhead: 5,
        }
    } else if lower.contains("mixtral") {
        FamilyProfile {
            chars_per_token: 3.5,
            per_message_overhead: 5,
        }
    } else if lower.contains("gemma") {
        FamilyProfile {
            chars_per_token: 4.0,
            per_message_overhead: 4,
        }
    } else if lower.contains("qwen") {
        FamilyProfile {
            chars_per_token: 3.0,
            per_message_overhead: 4,
        }
    } else if lower.contains("claude") {
        FamilyProfile {
            chars_per_token: 3.5,
            per_message_overhead: 4,
        }
    } else if lower.contains("gemini") {
        FamilyProfile {
            chars_per_token: 4.0,
            per_message_overhead: 4,
        }
    } else {
        DEFAULT_PROFILE
    }
}

const TOOL_BLOCK_OVERHEAD_TOKENS: u64 = 50;
const CONVERSATION_OVERHEAD_TOKENS: u64 = 3;

fn output_ratio(request_type: RequestType) -> f64 {
    match request_type {
        RequestType::Simple => 0.3,
        RequestType::Complex | RequestType::Creative | RequestType::ToolHeavy => 0.6,
        RequestType::Reasoning => 0.8,
    }
}

/// Estimate input tokens for a conversation against a target model family.
pub fn estimate_input_tokens(messages: &[Message], tools: Option<&[ToolDefinition]>, model_name: &str) -> u64 {
    let profile = family_profile(model_name);
    let mut total = CONVERSATION_OVERHEAD_TOKENS;

    for m in messages {
        let text = m.content.text_only();
        let chars = text.chars().count() as f64;
        let body_tokens = (chars / profile.chars_per_token).ceil() as u64;
        total += body_tokens + profile.per_message_overhead;
    }

    if let Some(tools) = tools {
        total += tools.len() as u64 * TOOL_BLOCK_OVERHEAD_TOKENS;
    }

    total
}

/// Estimate output tokens from a declared `max_tokens` budget and the
/// request's classification (ratio table in §4.2). Falls back to 0.5 for
/// classifications with no explicit ratio (there are none currently, but this
/// keeps the function total).
pub fn estimate_output_tokens(max_tokens: u64, request_type: RequestType) -> u64 {
    (max_tokens as f64 * output_ratio(request_type)).round() as u64
}

pub fn fits_in_context_window(input_tokens: u64, output_tokens: u64, context_window: u64) -> bool {
    input_tokens + output_tokens <= context_window
}

/// Whether a model's context window supports `required` tokens once a 20%
/// safety margin is applied.
pub fn supports_context_window(context_window: u64, required: u64) -> bool {
    context_window as f64 >= required as f64 * SAFETY_MARGIN
}
