//! Selective takeaways generation.
//!
//! Narrows the takeaways schema to the requested fields, asks the
//! [`TextGenerator`] for a value matching it, validates the result and applies
//! list index filters.

use std::fmt::Write as _;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use takeaways_provider::{GenerationRequest, TextGenerator};
use takeaways_schema::{
    ObjectSchema, apply_index_filters, narrow, takeaways_schema, validate_selection,
};
use takeaways_shared::{
    FieldSelection, ProgressSink, Result, Takeaways, TakeawaysError, require_term,
};

/// Name under which the schema is sent to structured-output providers.
pub const SCHEMA_NAME: &str = "takeaways";

/// Progress reported just before the provider call.
pub const PROGRESS_BEFORE_CALL: f64 = 0.2;

const SYSTEM_PROMPT: &str = "You are an API documentation expert writing glossary entries \
for developers. Be accurate and concise, prefer concrete examples over abstractions, and \
only cite resources that exist. Answer with JSON that matches the provided schema.";

/// Output of [`generate_takeaways`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTakeaways {
    pub term: String,
    pub takeaways: Takeaways,
    /// The selection the value was generated for, echoed back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldSelection>,
}

/// Generate takeaways for `term`, restricted to `fields` when given.
///
/// A selection that selects nothing produces empty takeaways without calling
/// the generator.
#[instrument(skip_all, fields(term = %term.trim()))]
pub async fn generate_takeaways(
    term: &str,
    fields: Option<&FieldSelection>,
    generator: &dyn TextGenerator,
    progress: &dyn ProgressSink,
) -> Result<GeneratedTakeaways> {
    let term = require_term(term)?;
    let full = takeaways_schema();
    if let Some(selection) = fields {
        validate_selection(&full, selection)?;
    }

    let schema = narrow(&full, fields);
    if schema.is_empty() {
        info!("selection is empty, nothing to generate");
        return Ok(GeneratedTakeaways {
            term: term.to_string(),
            takeaways: Takeaways::default(),
            fields: fields.cloned(),
        });
    }

    let request = GenerationRequest {
        schema_name: SCHEMA_NAME.to_string(),
        schema: schema.to_json_schema(),
        prompt: user_prompt(term, &schema),
        system_prompt: SYSTEM_PROMPT.to_string(),
    };

    progress.set_progress(PROGRESS_BEFORE_CALL);
    debug!(provider = generator.name(), fields = ?schema.names(), "requesting generation");

    let generation = generator.generate(&request).await.map_err(|e| {
        warn!(provider = generator.name(), error = %e, "generation failed");
        provider_failure(term)
    })?;

    if let Some(usage) = &generation.usage {
        progress.record_metric("prompt_tokens", usage.prompt_tokens as f64);
        progress.record_metric("completion_tokens", usage.completion_tokens as f64);
        progress.record_metric("total_tokens", usage.total_tokens as f64);
    }

    let mut value = generation.value;
    if let Err(violation) = schema.validate(&value) {
        warn!(%violation, "generated value does not match the schema");
        return Err(provider_failure(term));
    }
    if let Some(selection) = fields {
        apply_index_filters(&mut value, selection);
    }

    let takeaways: Takeaways = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "generated value is not valid takeaways");
        provider_failure(term)
    })?;

    info!(fields = ?schema.names(), "takeaways generated");
    Ok(GeneratedTakeaways {
        term: term.to_string(),
        takeaways,
        fields: fields.cloned(),
    })
}

fn provider_failure(term: &str) -> TakeawaysError {
    TakeawaysError::Provider {
        term: term.to_string(),
    }
}

/// The user prompt naming the term and every requested field.
fn user_prompt(term: &str, schema: &ObjectSchema) -> String {
    let mut prompt = format!(
        "Write the glossary takeaways for the API term \"{term}\".\n\nProduce exactly these fields:\n"
    );
    for field in schema.fields() {
        match &field.node.description {
            Some(description) => {
                let _ = writeln!(prompt, "- {}: {description}", field.name);
            }
            None => {
                let _ = writeln!(prompt, "- {}", field.name);
            }
        }
    }
    prompt
}
