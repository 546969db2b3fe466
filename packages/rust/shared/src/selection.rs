//! Field selection model: which parts of a takeaways document to operate on.
//!
//! On the wire a selection is a JSON object keyed by field name whose values
//! are `true`/`false`, an array of list indices, or a nested object of the
//! same shape:
//!
//! ```json
//! { "tldr": true, "definitionAndStructure": [0, 1], "usageInAPIs": { "description": true } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a single field is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Not requested (`false`, or the name is absent).
    Unselected,
    /// The whole field (`true`).
    All,
    /// Only these positions of a list field, in this order.
    Indices(Vec<usize>),
    /// Only the listed sub-fields of an object field.
    Partial(FieldSelection),
}

impl Selector {
    /// Whether this selector requests anything at all.
    pub fn is_selected(&self) -> bool {
        match self {
            Self::Unselected => false,
            Self::All | Self::Indices(_) => true,
            Self::Partial(sub) => sub.has_selected(),
        }
    }
}

/// A recursive specification of requested fields.
///
/// `None` at the call sites means "everything"; an empty selection means
/// "nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, RawSelector>", into = "BTreeMap<String, RawSelector>")]
pub struct FieldSelection {
    fields: BTreeMap<String, Selector>,
}

impl FieldSelection {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, selector: Selector) -> Self {
        self.fields.insert(name.into(), selector);
        self
    }

    /// The selector for `name`, [`Selector::Unselected`] when absent.
    pub fn get(&self, name: &str) -> &Selector {
        self.fields.get(name).unwrap_or(&Selector::Unselected)
    }

    /// Iterate over every named entry, selected or not.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when no names are present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when at least one entry requests something.
    pub fn has_selected(&self) -> bool {
        self.fields.values().any(Selector::is_selected)
    }

    /// Names of the selected top-level fields.
    pub fn selected_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, s)| s.is_selected())
            .map(|(name, _)| name)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Wire representation
// ---------------------------------------------------------------------------

/// Untagged JSON shape of a selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSelector {
    Flag(bool),
    Indices(Vec<i64>),
    Nested(BTreeMap<String, RawSelector>),
}

impl From<RawSelector> for Selector {
    fn from(raw: RawSelector) -> Self {
        match raw {
            RawSelector::Flag(true) => Self::All,
            RawSelector::Flag(false) => Self::Unselected,
            // Negative positions can never exist in a list.
            RawSelector::Indices(indices) => Self::Indices(
                indices
                    .into_iter()
                    .filter_map(|i| usize::try_from(i).ok())
                    .collect(),
            ),
            // `{}` means the same as `true`.
            RawSelector::Nested(map) if map.is_empty() => Self::All,
            RawSelector::Nested(map) => Self::Partial(FieldSelection::from(map)),
        }
    }
}

impl From<Selector> for RawSelector {
    fn from(selector: Selector) -> Self {
        match selector {
            Selector::Unselected => Self::Flag(false),
            Selector::All => Self::Flag(true),
            Selector::Indices(indices) => {
                Self::Indices(indices.into_iter().map(|i| i as i64).collect())
            }
            Selector::Partial(sub) => Self::Nested(sub.into()),
        }
    }
}

impl From<BTreeMap<String, RawSelector>> for FieldSelection {
    fn from(map: BTreeMap<String, RawSelector>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl From<FieldSelection> for BTreeMap<String, RawSelector> {
    fn from(selection: FieldSelection) -> Self {
        selection
            .fields
            .into_iter()
            .map(|(k, v)| (k, v.into()))
            .collect()
    }
}
