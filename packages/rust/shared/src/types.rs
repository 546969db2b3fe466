//! Core domain types for glossary takeaways.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::GlossaryConfig;
use crate::error::{Result, TakeawaysError};

// ---------------------------------------------------------------------------
// Takeaways
// ---------------------------------------------------------------------------

/// A `{key, value}` pair used by the definition and history lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// How the term shows up in real APIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInApis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A recommended reading entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub title: String,
    pub url: String,
}

/// The structured content document generated for a glossary term.
///
/// Every field is optional so the same type carries both complete documents
/// and the partial output of a selective generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Takeaways {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tldr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_and_structure: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<Vec<KeyValue>>,
    #[serde(
        rename = "usageInAPIs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub usage_in_apis: Option<UsageInApis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_practices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_reading: Option<Vec<Reading>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_you_know: Option<String>,
}

impl Takeaways {
    /// True when all seven top-level fields and both usage sub-fields are present.
    pub fn is_complete(&self) -> bool {
        self.tldr.is_some()
            && self.definition_and_structure.is_some()
            && self.historical_context.is_some()
            && self
                .usage_in_apis
                .as_ref()
                .is_some_and(|u| u.tags.is_some() && u.description.is_some())
            && self.best_practices.is_some()
            && self.recommended_reading.is_some()
            && self.did_you_know.is_some()
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Document location
// ---------------------------------------------------------------------------

/// Turn a term into a URL-safe slug (`"MIME types"` → `mime-types`).
pub fn slugify(term: &str) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lower = term.trim().to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Check the term precondition shared by every operation.
///
/// Returns the trimmed term. Runs before any I/O.
pub fn require_term(term: &str) -> Result<&str> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return Err(TakeawaysError::validation("term required"));
    }
    Ok(trimmed)
}

/// Resolve the repository path of a term's glossary document.
pub fn document_path(glossary: &GlossaryConfig, term: &str) -> Result<String> {
    let slug = slugify(require_term(term)?);
    if slug.is_empty() {
        return Err(TakeawaysError::validation(format!(
            "term {term:?} has no URL-safe characters"
        )));
    }
    let dir = glossary.content_dir.trim_end_matches('/');
    Ok(format!("{dir}/{slug}.{}", glossary.extension))
}

// ---------------------------------------------------------------------------
// ChangeRequest
// ---------------------------------------------------------------------------

/// A pull request opened against the main integration branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Pull-request number.
    pub number: u64,
    /// Browser URL of the pull request.
    pub url: String,
}
