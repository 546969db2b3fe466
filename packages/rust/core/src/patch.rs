//! Read-modify-render of a glossary document's takeaways front-matter.

use serde::Serialize;
use tracing::{info, instrument};

use takeaways_frontmatter::{
    content_digest, merge_takeaways, parse_front_matter, render_document, split_front_matter,
};
use takeaways_github::SourceControl;
use takeaways_schema::{takeaways_schema, validate_selection};
use takeaways_shared::{
    AppConfig, FieldSelection, GlossaryConfig, Result, Takeaways, document_path, require_term,
    slugify,
};

/// Where glossary documents live in the source-of-truth repository.
#[derive(Debug, Clone)]
pub struct DocumentLocation {
    pub glossary: GlossaryConfig,
    /// Branch documents are read from and pull requests target.
    pub base_branch: String,
}

impl DocumentLocation {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            glossary: config.glossary.clone(),
            base_branch: config.github.base_branch.clone(),
        }
    }

    /// Repository path of the document for `term`.
    pub fn path_for(&self, term: &str) -> Result<String> {
        document_path(&self.glossary, term)
    }
}

/// A rendered document ready to be written back.
#[derive(Debug, Clone, Serialize)]
pub struct PatchedDocument {
    pub term: String,
    pub slug: String,
    pub path: String,
    /// Full new document.
    pub content: String,
    /// Version token of the document that was read.
    pub version: String,
    /// Dotted paths of the written fields.
    pub updated_fields: Vec<String>,
    /// Written values keyed by the same paths.
    pub updated: serde_yaml::Mapping,
}

/// Merge `takeaways` into the front-matter of `term`'s document.
///
/// With `fields = None` the whole `takeaways` map is replaced. The document
/// body is carried over unchanged.
#[instrument(skip_all, fields(term = %term.trim()))]
pub async fn patch_document(
    term: &str,
    takeaways: &Takeaways,
    fields: Option<&FieldSelection>,
    vcs: &dyn SourceControl,
    location: &DocumentLocation,
) -> Result<PatchedDocument> {
    let term = require_term(term)?;
    if let Some(selection) = fields {
        validate_selection(&takeaways_schema(), selection)?;
    }
    let path = location.path_for(term)?;

    let remote = vcs.get_file(&path, &location.base_branch).await?;
    let document = split_front_matter(&remote.content)?;
    let mut front_matter = parse_front_matter(document.yaml)?;

    let merged = merge_takeaways(&mut front_matter, takeaways, fields)?;
    let content = render_document(&front_matter, document.body)?;

    info!(
        %path,
        fields = ?merged.updated_fields,
        previous_version = %remote.version,
        digest = %content_digest(&content),
        "document patched"
    );

    Ok(PatchedDocument {
        term: term.to_string(),
        slug: slugify(term),
        path,
        content,
        version: remote.version,
        updated_fields: merged.updated_fields,
        updated: merged.updated,
    })
}
