//! Selection-aware merge of new takeaways into existing front-matter.

use serde_yaml::{Mapping, Value};

use takeaways_shared::{FieldSelection, Result, Selector, Takeaways, TakeawaysError};

use crate::TAKEAWAYS_KEY;

/// What a merge wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Dotted paths of written fields (`tldr`, `usageInAPIs.description`).
    pub updated_fields: Vec<String>,
    /// Written values keyed by the same dotted paths.
    pub updated: Mapping,
}

/// Merge `takeaways` into `front_matter[takeaways]`.
///
/// Without a selection the whole `takeaways` map is replaced. With one, only
/// selected fields that the new value actually carries are overwritten;
/// partial selectors descend into nested maps so unselected sub-fields
/// survive.
pub fn merge_takeaways(
    front_matter: &mut Mapping,
    takeaways: &Takeaways,
    fields: Option<&FieldSelection>,
) -> Result<MergeOutcome> {
    let source = match serde_yaml::to_value(takeaways)
        .map_err(|e| TakeawaysError::parse(format!("failed to encode takeaways: {e}")))?
    {
        Value::Mapping(map) => map,
        _ => Mapping::new(),
    };

    let mut outcome = MergeOutcome::default();

    let Some(selection) = fields else {
        for (key, value) in &source {
            if let Some(name) = key.as_str() {
                record(&mut outcome, name.to_string(), value);
            }
        }
        front_matter.insert(TAKEAWAYS_KEY.into(), Value::Mapping(source));
        return Ok(outcome);
    };

    let mut target = mapping_at(front_matter, TAKEAWAYS_KEY);
    merge_selected(&mut target, &source, selection, "", &mut outcome);
    if !outcome.updated_fields.is_empty() {
        front_matter.insert(TAKEAWAYS_KEY.into(), Value::Mapping(target));
    }
    Ok(outcome)
}

fn merge_selected(
    target: &mut Mapping,
    source: &Mapping,
    selection: &FieldSelection,
    prefix: &str,
    outcome: &mut MergeOutcome,
) {
    for (name, selector) in selection.iter() {
        let path = format!("{prefix}{name}");
        match selector {
            Selector::Unselected => {}
            Selector::All | Selector::Indices(_) => {
                if let Some(value) = source.get(name) {
                    target.insert(name.into(), value.clone());
                    record(outcome, path, value);
                }
            }
            Selector::Partial(sub) => {
                if let Some(Value::Mapping(inner_source)) = source.get(name) {
                    let written = outcome.updated_fields.len();
                    let mut inner = mapping_at(target, name);
                    merge_selected(&mut inner, inner_source, sub, &format!("{path}."), outcome);
                    if outcome.updated_fields.len() > written {
                        target.insert(name.into(), Value::Mapping(inner));
                    }
                }
            }
        }
    }
}

fn record(outcome: &mut MergeOutcome, path: String, value: &Value) {
    outcome.updated.insert(Value::String(path.clone()), value.clone());
    outcome.updated_fields.push(path);
}

/// Copy of `map[key]` when it is a mapping, otherwise an empty one.
///
/// The caller writes the copy back only when a field landed in it, so a
/// merge that writes nothing leaves `map` as it was.
fn mapping_at(map: &Mapping, key: &str) -> Mapping {
    match map.get(key) {
        Some(Value::Mapping(inner)) => inner.clone(),
        _ => Mapping::new(),
    }
}
