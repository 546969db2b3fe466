//! Text-generation providers.
//!
//! A provider turns a prompt plus a JSON Schema into a structured JSON value.
//! [`OpenRouterClient`] talks to any OpenAI-compatible chat completions API
//! that supports `response_format: json_schema`.

mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use takeaways_shared::Result;

pub use openrouter::{OpenRouterClient, OpenRouterOptions};

/// One structured generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Identifier of the output schema (letters, digits, `_` and `-`).
    pub schema_name: String,
    /// JSON Schema the output must match.
    pub schema: serde_json::Value,
    /// User prompt.
    pub prompt: String,
    /// System prompt.
    pub system_prompt: String,
}

/// Token counters reported by the provider. Missing counters read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A structured value produced by a provider.
#[derive(Debug, Clone)]
pub struct Generation {
    pub value: serde_json::Value,
    pub usage: Option<TokenUsage>,
}

/// A provider of schema-constrained text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Generate a value constrained to `request.schema`.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;
}
