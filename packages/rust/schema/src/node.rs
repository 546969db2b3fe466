//! Explicit schema description values.
//!
//! A schema is a tree of [`SchemaNode`]s. Objects keep their fields in
//! declaration order so rendered JSON Schemas and prompts are stable.

use serde_json::{Map, Value, json};

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    /// A UTF-8 string.
    String,
    /// A homogeneous list.
    List(Box<SchemaNode>),
    /// A record with named fields.
    Object(ObjectSchema),
}

/// A schema node with an optional human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub description: Option<String>,
}

/// A named field of an [`ObjectSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub node: SchemaNode,
}

/// An ordered set of named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
    fields: Vec<Field>,
}

/// A generated value that does not match its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {problem}")]
pub struct SchemaViolation {
    /// JSON-path-like location, e.g. `$.usageInAPIs.tags[1]`.
    pub path: String,
    pub problem: String,
}

impl SchemaNode {
    pub fn string(description: &str) -> Self {
        Self {
            kind: SchemaKind::String,
            description: Some(description.to_string()),
        }
    }

    pub fn list(item: SchemaNode, description: &str) -> Self {
        Self {
            kind: SchemaKind::List(Box::new(item)),
            description: Some(description.to_string()),
        }
    }

    pub fn object(schema: ObjectSchema, description: &str) -> Self {
        Self {
            kind: SchemaKind::Object(schema),
            description: Some(description.to_string()),
        }
    }

    /// Item node without a description, for list elements.
    pub fn bare(kind: SchemaKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, SchemaKind::List(_))
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(schema) => Some(schema),
            _ => None,
        }
    }

    /// Render as a strict JSON Schema fragment.
    pub fn to_json_schema(&self) -> Value {
        let mut out = match &self.kind {
            SchemaKind::String => json!({ "type": "string" }),
            SchemaKind::List(item) => json!({ "type": "array", "items": item.to_json_schema() }),
            SchemaKind::Object(schema) => schema.to_json_schema(),
        };
        if let (Some(desc), Some(obj)) = (&self.description, out.as_object_mut()) {
            obj.insert("description".into(), Value::String(desc.clone()));
        }
        out
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        match (&self.kind, value) {
            (SchemaKind::String, Value::String(_)) => Ok(()),
            (SchemaKind::List(item), Value::Array(items)) => {
                for (i, v) in items.iter().enumerate() {
                    item.check(v, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            (SchemaKind::Object(schema), Value::Object(map)) => schema.check(map, path),
            (kind, _) => Err(SchemaViolation {
                path: path.to_string(),
                problem: format!("expected {}", kind_name(kind)),
            }),
        }
    }
}

fn kind_name(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::String => "string",
        SchemaKind::List(_) => "array",
        SchemaKind::Object(_) => "object",
    }
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn field(mut self, name: &str, node: SchemaNode) -> Self {
        self.push(name, node);
        self
    }

    pub fn push(&mut self, name: &str, node: SchemaNode) {
        self.fields.push(Field {
            name: name.to_string(),
            node,
        });
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.node)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render as a strict JSON Schema object: every property is required and
    /// no extra properties are allowed.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.node.to_json_schema());
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.names(),
            "additionalProperties": false,
        })
    }

    /// Check a generated value against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        match value {
            Value::Object(map) => self.check(map, "$"),
            _ => Err(SchemaViolation {
                path: "$".into(),
                problem: "expected object".into(),
            }),
        }
    }

    fn check(&self, map: &Map<String, Value>, path: &str) -> Result<(), SchemaViolation> {
        for field in &self.fields {
            let field_path = format!("{path}.{}", field.name);
            match map.get(&field.name) {
                Some(v) => field.node.check(v, &field_path)?,
                None => {
                    return Err(SchemaViolation {
                        path: field_path,
                        problem: "missing required field".into(),
                    });
                }
            }
        }
        if let Some(extra) = map.keys().find(|k| self.get(k).is_none()) {
            return Err(SchemaViolation {
                path: format!("{path}.{extra}"),
                problem: "unexpected field".into(),
            });
        }
        Ok(())
    }
}
