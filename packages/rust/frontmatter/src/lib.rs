//! YAML front-matter handling for glossary documents.
//!
//! A document is a `---` delimited YAML block followed by an arbitrary
//! markdown body. Only the front-matter is ever rewritten; the body slice is
//! carried through byte for byte.

mod merge;

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use takeaways_shared::{Result, Takeaways, TakeawaysError};

pub use merge::{MergeOutcome, merge_takeaways};

/// Front-matter key holding the takeaways map.
pub const TAKEAWAYS_KEY: &str = "takeaways";

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// A document split into its front-matter source and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// YAML source between the delimiters (no delimiter lines).
    pub yaml: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
}

/// Split a document at its `---` delimiter lines.
///
/// The closing delimiter is the first line consisting of exactly `---`, so
/// horizontal rules in the body are never mistaken for it.
pub fn split_front_matter(document: &str) -> Result<FrontMatter<'_>> {
    static FRONT_MATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A---\r?\n(?:---|(.*?)\r?\n---)(?:\r?\n|\z)").expect("valid regex")
    });

    let captures = FRONT_MATTER_RE
        .captures(document)
        .ok_or_else(|| TakeawaysError::parse("document has no `---` front-matter block"))?;

    let whole = captures.get(0).map_or(0..0, |m| m.range());
    let yaml = captures.get(1).map_or("", |m| m.as_str());

    Ok(FrontMatter {
        yaml,
        body: &document[whole.end..],
    })
}

// ---------------------------------------------------------------------------
// Parse / render
// ---------------------------------------------------------------------------

/// Parse front-matter YAML into a mapping. An empty block is an empty mapping.
pub fn parse_front_matter(yaml: &str) -> Result<Mapping> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| TakeawaysError::parse(format!("invalid front-matter YAML: {e}")))?;

    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(TakeawaysError::parse(format!(
            "front-matter must be a mapping, found {}",
            value_kind(&other)
        ))),
    }
}

/// Serialize a front-matter mapping and reattach the untouched body.
pub fn render_document(front_matter: &Mapping, body: &str) -> Result<String> {
    let mut yaml = serde_yaml::to_string(front_matter)
        .map_err(|e| TakeawaysError::parse(format!("failed to serialize front-matter: {e}")))?;
    if !yaml.ends_with('\n') {
        yaml.push('\n');
    }

    debug!(yaml_len = yaml.len(), body_len = body.len(), "rendering document");
    Ok(format!("---\n{yaml}---\n{body}"))
}

/// Read the current `takeaways` map, if any.
pub fn read_takeaways(front_matter: &Mapping) -> Result<Option<Takeaways>> {
    match front_matter.get(TAKEAWAYS_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_yaml::from_value(value.clone())
            .map(Some)
            .map_err(|e| TakeawaysError::parse(format!("invalid takeaways in front-matter: {e}"))),
    }
}

/// SHA-256 hex digest of a document, used in audit logs.
pub fn content_digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
