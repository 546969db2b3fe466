//! Branch, commit and pull-request publication of a patched document, and
//! the manual cleanup that undoes it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use takeaways_github::{FileWrite, NewChangeRequest, SourceControl};
use takeaways_shared::{ChangeRequest, PublishStep, Result, TakeawaysError};

use crate::patch::PatchedDocument;

/// A published change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub pull_request: ChangeRequest,
    pub branch: String,
}

/// Feature branch name for a document update.
///
/// Two updates of the same term within one millisecond collide.
pub fn branch_name(slug: &str, now: DateTime<Utc>) -> String {
    format!("update-glossary-{slug}-{}", now.timestamp_millis())
}

/// Pull-request title.
pub fn change_title(term: &str) -> String {
    format!("Update takeaways for {term}")
}

/// Pull-request body listing the updated fields.
pub fn change_body(term: &str, updated_fields: &[String]) -> String {
    let mut body = format!("Regenerated glossary takeaways for **{term}**.\n\n");
    if updated_fields.is_empty() {
        body.push_str("No fields were changed.\n");
    } else {
        body.push_str("Updated fields:\n");
        for field in updated_fields {
            body.push_str(&format!("- `{field}`\n"));
        }
    }
    body
}

/// Commit the patched document to a fresh branch and open a pull request.
///
/// Steps run in order and the first failure aborts. A version mismatch on the
/// write surfaces as `Conflict`; any other failure as `Publish` naming the
/// step. Branches created before a failure are left in place.
#[instrument(skip_all, fields(term = %patched.term, path = %patched.path))]
pub async fn publish_change(
    patched: &PatchedDocument,
    vcs: &dyn SourceControl,
    base_branch: &str,
    now: DateTime<Utc>,
) -> Result<Publication> {
    let branch = branch_name(&patched.slug, now);

    let base_sha = vcs
        .get_ref(base_branch)
        .await
        .map_err(step_error(PublishStep::GetRef))?;

    vcs.create_ref(&branch, &base_sha)
        .await
        .map_err(step_error(PublishStep::CreateBranch))?;
    info!(%branch, %base_sha, "branch created");

    let message = format!("docs(glossary): update takeaways for {}", patched.term);
    vcs.put_file(&FileWrite {
        path: &patched.path,
        content: &patched.content,
        branch: &branch,
        expected_version: &patched.version,
        message: &message,
    })
    .await
    .map_err(step_error(PublishStep::WriteFile))?;

    let title = change_title(&patched.term);
    let body = change_body(&patched.term, &patched.updated_fields);
    let pull_request = vcs
        .open_change_request(&NewChangeRequest {
            branch: &branch,
            base: base_branch,
            title: &title,
            body: &body,
        })
        .await
        .map_err(step_error(PublishStep::OpenPullRequest))?;

    info!(number = pull_request.number, url = %pull_request.url, "pull request opened");
    Ok(Publication {
        pull_request,
        branch,
    })
}

fn step_error(step: PublishStep) -> impl Fn(TakeawaysError) -> TakeawaysError {
    move |err| match err {
        conflict @ TakeawaysError::Conflict { .. } => conflict,
        other => {
            warn!(%step, error = %other, "publish step failed");
            TakeawaysError::publish(step, other.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Result of one cleanup sub-step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    Failed(String),
}

impl StepOutcome {
    fn from_result(step: PublishStep, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(e) => {
                let err = TakeawaysError::publish(step, e.to_string());
                warn!(%step, error = %e, "cleanup step failed");
                Self::Failed(err.to_string())
            }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Per-step report of [`cleanup_change`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub pull_request: StepOutcome,
    pub branch: StepOutcome,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.pull_request.is_done() && self.branch.is_done()
    }
}

/// Close a pull request and delete its branch.
///
/// Both sub-steps always run; neither failure stops the other.
#[instrument(skip(vcs))]
pub async fn cleanup_change(vcs: &dyn SourceControl, number: u64, branch: &str) -> CleanupReport {
    let pull_request = StepOutcome::from_result(
        PublishStep::ClosePullRequest,
        vcs.close_change_request(number).await,
    );
    let branch_outcome =
        StepOutcome::from_result(PublishStep::DeleteBranch, vcs.delete_ref(branch).await);

    let report = CleanupReport {
        pull_request,
        branch: branch_outcome,
    };
    info!(clean = report.is_clean(), "cleanup finished");
    report
}
