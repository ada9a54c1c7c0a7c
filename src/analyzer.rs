//! Request Analyzer (SPEC_FULL.md §4.1): classifies a request into a coarse
//! bucket, estimates token counts are left to `categorizer`, and computes a
//! depth/priority/complexity summary consumed by the Selector.

use crate::model::{Message, Priority, RequestType, Role, ToolDefinition};
use regex::RegexSet;
use std::sync::LazyLock;

const LARGE_CONTEXT_TOKEN_THRESHOLD: u64 = 8_000;
const COMPLEX_LENGTH_THRESHOLD: usize = 200;

static REASONING_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)step[- ]by[- ]step",
        r"(?i)\bchain of thought\b",
        r"(?i)\bprove\b|\bproof\b",
        r"(?i)\bderive\b",
        r"(?i)\bsolve\b.*\bequation\b",
        r"(?i)\breason through\b",
        r"(?i)\bthink (carefully|through)\b",
    ])
    .expect("static reasoning pattern set compiles")
});

static COMPLEX_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\barchitecture\b",
        r"(?i)\balgorithm\b",
        r"(?i)\brefactor\b",
        r"(?i)\boptimi[sz]e\b",
        r"(?i)\bcompare and contrast\b",
        r"(?i)\btrade-?offs?\b",
        r"(?i)\banaly[sz]e\b",
        r"(?i)\bdesign a system\b",
    ])
    .expect("static complex pattern set compiles")
});

static CREATIVE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bwrite a (poem|story|song)\b",
        r"(?i)\bbrainstorm\b",
        r"(?i)\bimagine\b",
        r"(?i)\bcompose\b",
        r"(?i)\bcreative\b",
    ])
    .expect("static creative pattern set compiles")
});

static TOOL_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bsearch for\b",
        r"(?i)\blook up\b",
        r"(?i)\bfetch\b",
        r"(?i)\bbrowse\b",
        r"(?i)\bexecute\b",
        r"(?i)\brun the\b",
        r"(?i)\bcall the api\b",
        r"(?i)\buse the .* tool\b",
    ])
    .expect("static tool pattern set compiles")
});

/// Four-way classification used internally before collapsing to the public
/// `RequestType` (which merges with `tool_heavy` only when tools are present).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Simple,
    Complex,
    Reasoning,
    Creative,
    ToolHeavy,
}

fn classify_text(text: &str, tools_non_empty: bool) -> Classification {
    if text.is_empty() {
        return Classification::Simple;
    }

    let reasoning_hits = REASONING_PATTERNS.matches(text).iter().count();
    let tool_hits = TOOL_PATTERNS.matches(text).iter().count();
    let complex_hits = COMPLEX_PATTERNS.matches(text).iter().count();
    let creative_hits = CREATIVE_PATTERNS.matches(text).iter().count();

    if reasoning_hits > 0 {
        Classification::Reasoning
    } else if tool_hits >= 2 && tools_non_empty {
        Classification::ToolHeavy
    } else if complex_hits > 0 || text.chars().count() > COMPLEX_LENGTH_THRESHOLD {
        Classification::Complex
    } else if creative_hits > 0 {
        Classification::Creative
    } else {
        Classification::Simple
    }
}

fn last_user_text(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.text_only())
        .unwrap_or_default()
}

/// Count user/assistant alternations, ignoring system messages and collapsing
/// consecutive runs of the same role.
fn conversation_depth(messages: &[Message]) -> u32 {
    let mut depth = 0u32;
    let mut last_role: Option<Role> = None;
    for m in messages {
        if m.role == Role::System {
            continue;
        }
        match last_role {
            Some(prev) if prev == m.role => {}
            Some(_) => depth += 1,
            None => {}
        }
        last_role = Some(m.role);
    }
    depth
}

/// Analyze a request (§4.1). `estimated_input_tokens` is supplied by the
/// categorizer/token calculator since token estimation depends on the target
/// model family, which isn't known at analysis time.
pub fn analyze(
    messages: &[Message],
    tools: Option<&[ToolDefinition]>,
    estimated_input_tokens: u64,
) -> crate::model::RequestAnalysis {
    use crate::model::RequestAnalysis;

    let has_tools = tools.is_some_and(|t| !t.is_empty());
    let text = last_user_text(messages);
    let classification = classify_text(&text, has_tools);

    let requires_large_context = estimated_input_tokens > LARGE_CONTEXT_TOKEN_THRESHOLD;
    let requires_reasoning = classification == Classification::Reasoning;
    let is_tool_heavy = classification == Classification::ToolHeavy && has_tools;

    let depth = conversation_depth(messages);

    let request_type = match classification {
        Classification::Simple => RequestType::Simple,
        Classification::Complex => RequestType::Complex,
        Classification::Reasoning => RequestType::Reasoning,
        Classification::Creative => RequestType::Creative,
        Classification::ToolHeavy => RequestType::ToolHeavy,
    };

    let priority = match request_type {
        RequestType::Reasoning => Priority::High,
        RequestType::Complex | RequestType::ToolHeavy => Priority::Medium,
        RequestType::Simple | RequestType::Creative => Priority::Normal,
    };

    let base_complexity: f32 = match request_type {
        RequestType::Simple => 1.0,
        RequestType::Complex | RequestType::Creative | RequestType::ToolHeavy => 4.0,
        RequestType::Reasoning => 7.0,
    };
    let mut complexity = base_complexity + (depth as f32 / 2.0).floor();
    if requires_large_context {
        complexity += 1.0;
    }
    let estimated_complexity = complexity.clamp(0.0, 10.0);

    RequestAnalysis {
        request_type,
        depth,
        requires_large_context,
        requires_reasoning,
        is_tool_heavy,
        has_tools,
        priority,
        estimated_complexity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;

    #[test]
    fn empty_content_is_simple() {
        let messages = vec![Message::user("")];
        let analysis = analyze(&messages, None, 0);
        assert_eq!(analysis.request_type, RequestType::Simple);
        assert_eq!(analysis.priority, Priority::Normal);
    }

    #[test]
    fn reasoning_keywords_take_precedence() {
        let messages = vec![Message::user(
            "Please solve this step by step and derive the formula, then search for references",
        )];
        let tools = vec![ToolDefinition {
            name: "search".into(),
            description: String::new(),
            parameters: serde_json::json!({}),
        }];
        let analysis = analyze(&messages, Some(&tools), 0);
        assert_eq!(analysis.request_type, RequestType::Reasoning);
        assert!(analysis.requires_reasoning);
        assert_eq!(analysis.priority, Priority::High);
    }

    #[test]
    fn tool_heavy_requires_two_hits_and_tools() {
        let messages = vec![Message::user("search for this and look up that")];
        let tools = vec![ToolDefinition {
            name: "search".into(),
            description: String::new(),
            parameters: serde_json::json!({}),
        }];
        let analysis = analyze(&messages, Some(&tools), 0);
        assert_eq!(analysis.request_type, RequestType::ToolHeavy);
        assert!(analysis.is_tool_heavy);

        // Without tools present, falls through to complex/simple rather than tool_heavy.
        let analysis_no_tools = analyze(&messages, None, 0);
        assert_ne!(analysis_no_tools.request_type, RequestType::ToolHeavy);
        assert!(!analysis_no_tools.is_tool_heavy);
    }

    #[test]
    fn long_content_without_keywords_is_complex() {
        let long = "a".repeat(250);
        let messages = vec![Message::user(long)];
        let analysis = analyze(&messages, None, 0);
        assert_eq!(analysis.request_type, RequestType::Complex);
    }

    #[test]
    fn creative_keywords_classify_creative() {
        let messages = vec![Message::user("write a poem about the sea")];
        let analysis = analyze(&messages, None, 0);
        assert_eq!(analysis.request_type, RequestType::Creative);
        assert_eq!(analysis.priority, Priority::Normal);
    }

    #[test]
    fn large_context_flag_set_from_token_estimate() {
        let messages = vec![Message::user("hello")];
        let analysis = analyze(&messages, None, 9_000);
        assert!(analysis.requires_large_context);
        assert!(analysis.estimated_complexity >= 2.0);
    }

    #[test]
    fn depth_counts_alternations_and_ignores_system() {
        let messages = vec![
            Message::system("sys"),
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("again"),
        ];
        assert_eq!(conversation_depth(&messages), 3);
    }

    #[test]
    fn complexity_clamped_to_ten() {
        let messages: Vec<Message> = (0..40)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user("solve step by step")
                } else {
                    Message::assistant("ok")
                }
            })
            .collect();
        let analysis = analyze(&messages, None, 20_000);
        assert!(analysis.estimated_complexity <= 10.0);
    }
}
