//! Workflow orchestration for glossary takeaways.
//!
//! This crate ties the schema, provider, front-matter and version-control
//! crates together into the generate, patch, publish and cleanup operations,
//! plus the retrying task runner that wraps them.

pub mod generate;
pub mod patch;
pub mod publish;
pub mod task;
pub mod workflow;

pub use generate::{GeneratedTakeaways, generate_takeaways};
pub use patch::{DocumentLocation, PatchedDocument, patch_document};
pub use publish::{
    CleanupReport, Publication, StepOutcome, branch_name, cleanup_change, publish_change,
};
pub use task::{RetryPolicy, run_task};
pub use workflow::{UpdateOutcome, Workflow, prepare_update, update_takeaways};
