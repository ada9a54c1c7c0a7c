//! Shared data model: provider credentials, the model catalog, categories,
//! request analysis, and selection results (SPEC_FULL.md §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a provider credential was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    User,
    Environment,
    Guardrail,
}

fn default_priority() -> u32 {
    100
}

/// A single upstream provider credential. Credentials sharing `provider_type`
/// form a pool that the Load Balancer rotates across.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub id: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub api_key: String,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: u32,
    pub source: CredentialSource,
}

impl std::fmt::Display for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.id, self.provider_type)
    }
}

/// Coarse model capability class, derived from the model name (§4.2) unless
/// overridden in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelCategory {
    Small,
    Large,
    Reasoning,
}

impl std::fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelCategory::Small => "SMALL",
            ModelCategory::Large => "LARGE",
            ModelCategory::Reasoning => "REASONING",
        };
        write!(f, "{s}")
    }
}

/// Per-million-token USD pricing for a model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pricing {
    pub input: f64,
    pub output: f64,
}

/// One catalog entry for a provider type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogModel {
    pub name: String,
    pub context_window: u64,
    pub pricing: Pricing,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub category: Option<ModelCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderModels {
    pub models: Vec<CatalogModel>,
}

/// Immutable, read-once mapping from provider type to its available models.
pub type Catalog = HashMap<String, ProviderModels>;

/// A catalog entry flattened with its provider type attached, used once
/// candidates have been pulled out of the per-provider grouping.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub provider_type: String,
    pub model: CatalogModel,
}

/// Conversation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single part of multi-modal message content; only `text` parts count
/// toward classification/token-estimation (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Message content, either a plain string or a list of multi-modal parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenate text parts only; plain text content is returned as-is.
    pub fn text_only(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }
}

/// Opaque tool definition; the core only needs to know tools exist and how
/// many, not their schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Request classification bucket (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Simple,
    Complex,
    Reasoning,
    Creative,
    ToolHeavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestAnalysis {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub depth: u32,
    pub requires_large_context: bool,
    pub requires_reasoning: bool,
    pub is_tool_heavy: bool,
    pub has_tools: bool,
    pub priority: Priority,
    pub estimated_complexity: f32,
}

/// Ordering policy applied to filtered candidates (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CostOptimized,
    QualityOptimized,
    Balanced,
    FreeTier,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Balanced
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub max_cost_per_million: Option<f64>,
}

/// The outcome of a successful `select_model` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub model: String,
    pub provider_type: String,
    pub category: ModelCategory,
    pub analysis: RequestAnalysis,
    pub candidate_count: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}
