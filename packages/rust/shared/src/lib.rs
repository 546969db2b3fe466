//! Shared types, error model, and configuration for the takeaways workflow.
//!
//! This crate is the foundation depended on by all other takeaways crates.
//! It provides:
//! - [`TakeawaysError`]: the unified error type
//! - Domain types ([`Takeaways`], [`ChangeRequest`], slug and path helpers)
//! - The field selection model ([`FieldSelection`], [`Selector`])
//! - The observability collaborator ([`ProgressSink`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod progress;
pub mod selection;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GitHubConfig, GlossaryConfig, ProviderConfig, RetryConfig, config_dir,
    config_file_path, github_token, init_config, load_config, load_config_from,
    provider_api_key, validate_credentials,
};
pub use error::{PublishStep, Result, TakeawaysError};
pub use progress::{ProgressSink, SilentProgress, TaskStatus, TracingProgress};
pub use selection::{FieldSelection, Selector};
pub use types::{
    ChangeRequest, KeyValue, Reading, Takeaways, UsageInApis, document_path, require_term,
    slugify,
};
