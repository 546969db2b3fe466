//! The end-to-end update: generate → patch → publish.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use takeaways_github::SourceControl;
use takeaways_provider::TextGenerator;
use takeaways_shared::{ChangeRequest, FieldSelection, ProgressSink, Result, require_term};

use crate::generate::generate_takeaways;
use crate::patch::{DocumentLocation, PatchedDocument, patch_document};
use crate::publish::publish_change;

/// Collaborators shared by every step of an update.
#[derive(Clone, Copy)]
pub struct Workflow<'a> {
    pub generator: &'a dyn TextGenerator,
    pub vcs: &'a dyn SourceControl,
    pub progress: &'a dyn ProgressSink,
    pub location: &'a DocumentLocation,
}

/// Result of [`update_takeaways`].
///
/// `pull_request` and `branch` are `None` when no field changed and nothing
/// was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub term: String,
    pub path: String,
    pub updated_fields: Vec<String>,
    pub pull_request: Option<ChangeRequest>,
    pub branch: Option<String>,
}

/// Regenerate the selected takeaways of `term` and open a pull request.
#[instrument(skip_all, fields(term = %term.trim()))]
pub async fn update_takeaways(
    workflow: &Workflow<'_>,
    term: &str,
    fields: Option<&FieldSelection>,
) -> Result<UpdateOutcome> {
    let patched = prepare_update(workflow, term, fields).await?;

    if patched.updated_fields.is_empty() {
        workflow.progress.set_progress(1.0);
        info!(path = %patched.path, "no fields changed, nothing to publish");
        return Ok(UpdateOutcome {
            term: patched.term,
            path: patched.path,
            updated_fields: Vec::new(),
            pull_request: None,
            branch: None,
        });
    }

    let publication = publish_change(
        &patched,
        workflow.vcs,
        &workflow.location.base_branch,
        Utc::now(),
    )
    .await?;
    workflow.progress.set_progress(1.0);

    info!(
        pull_request = publication.pull_request.number,
        branch = %publication.branch,
        "takeaways update published"
    );

    Ok(UpdateOutcome {
        term: patched.term,
        path: patched.path,
        updated_fields: patched.updated_fields,
        pull_request: Some(publication.pull_request),
        branch: Some(publication.branch),
    })
}

/// Generate and patch without publishing. Used for dry runs.
pub async fn prepare_update(
    workflow: &Workflow<'_>,
    term: &str,
    fields: Option<&FieldSelection>,
) -> Result<PatchedDocument> {
    let term = require_term(term)?;

    let generated =
        generate_takeaways(term, fields, workflow.generator, workflow.progress).await?;
    workflow.progress.set_progress(0.5);

    let patched = patch_document(
        term,
        &generated.takeaways,
        fields,
        workflow.vcs,
        workflow.location,
    )
    .await?;
    workflow.progress.set_progress(0.7);

    Ok(patched)
}
