//! Schema description, narrowing and index filtering for takeaways.
//!
//! This crate provides:
//! - [`node`]: explicit schema nodes, JSON Schema rendering, value validation
//! - [`takeaways`]: the full takeaways schema and its field names
//! - [`narrow`](mod@narrow): selection-driven narrowing and index filtering

pub mod narrow;
pub mod node;
pub mod takeaways;

pub use narrow::{apply_index_filters, narrow, select_indices, validate_selection};
pub use node::{Field, ObjectSchema, SchemaKind, SchemaNode, SchemaViolation};
pub use takeaways::{TOP_LEVEL_FIELDS, takeaways_schema};
