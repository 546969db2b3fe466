//! Schema narrowing and post-generation index filtering.
//!
//! Narrowing decides *which fields* a generator produces; index filtering
//! decides *which list items* survive afterwards. A list selected by indices
//! therefore stays a full list in the narrowed schema.

use serde_json::Value;
use takeaways_shared::{FieldSelection, Result, Selector, TakeawaysError};

use crate::node::{ObjectSchema, SchemaKind, SchemaNode};

/// Restrict `schema` to the fields requested by `selection`.
///
/// `None` returns the schema unchanged. Fields keep their schema order.
pub fn narrow(schema: &ObjectSchema, selection: Option<&FieldSelection>) -> ObjectSchema {
    let Some(selection) = selection else {
        return schema.clone();
    };

    let mut out = ObjectSchema::new();
    for field in schema.fields() {
        match selection.get(&field.name) {
            Selector::Unselected => {}
            Selector::All | Selector::Indices(_) => out.push(&field.name, field.node.clone()),
            Selector::Partial(sub) => match &field.node.kind {
                SchemaKind::Object(inner) => {
                    let narrowed = narrow(inner, Some(sub));
                    if !narrowed.is_empty() {
                        out.push(
                            &field.name,
                            SchemaNode {
                                kind: SchemaKind::Object(narrowed),
                                description: field.node.description.clone(),
                            },
                        );
                    }
                }
                // Rejected by `validate_selection`; keep the field whole.
                SchemaKind::String | SchemaKind::List(_) => {
                    out.push(&field.name, field.node.clone())
                }
            },
        }
    }
    out
}

/// Check that every selector names a real field and fits its kind.
pub fn validate_selection(schema: &ObjectSchema, selection: &FieldSelection) -> Result<()> {
    validate_at(schema, selection, "")
}

fn validate_at(schema: &ObjectSchema, selection: &FieldSelection, prefix: &str) -> Result<()> {
    for (name, selector) in selection.iter() {
        let path = format!("{prefix}{name}");
        let node = schema.get(name).ok_or_else(|| {
            TakeawaysError::validation(format!("unknown takeaways field: {path}"))
        })?;

        match selector {
            Selector::Unselected | Selector::All => {}
            Selector::Indices(_) if node.is_list() => {}
            Selector::Indices(_) => {
                return Err(TakeawaysError::validation(format!(
                    "field {path} is not a list and cannot be selected by index"
                )));
            }
            Selector::Partial(sub) => match node.as_object() {
                Some(inner) => validate_at(inner, sub, &format!("{path}."))?,
                None => {
                    return Err(TakeawaysError::validation(format!(
                        "field {path} has no sub-fields to select"
                    )));
                }
            },
        }
    }
    Ok(())
}

/// The elements of `list` at `indices`, in the order of `indices`.
///
/// Out-of-range positions are skipped; duplicates are kept.
pub fn select_indices<T: Clone>(list: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().filter_map(|&i| list.get(i).cloned()).collect()
}

/// Apply every index selector in `selection` to a generated value in place.
///
/// Fields whose value is not a list are left untouched.
pub fn apply_index_filters(value: &mut Value, selection: &FieldSelection) {
    let Some(map) = value.as_object_mut() else {
        return;
    };

    for (name, selector) in selection.iter() {
        let Some(field) = map.get_mut(name) else {
            continue;
        };
        match selector {
            Selector::Indices(indices) => {
                if let Value::Array(items) = field {
                    let kept = select_indices(items.as_slice(), indices);
                    *items = kept;
                }
            }
            Selector::Partial(sub) => apply_index_filters(field, sub),
            Selector::Unselected | Selector::All => {}
        }
    }
}
