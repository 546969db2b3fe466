//! The full schema of a takeaways document.

use crate::node::{ObjectSchema, SchemaKind, SchemaNode};

pub const TLDR: &str = "tldr";
pub const DEFINITION_AND_STRUCTURE: &str = "definitionAndStructure";
pub const HISTORICAL_CONTEXT: &str = "historicalContext";
pub const USAGE_IN_APIS: &str = "usageInAPIs";
pub const BEST_PRACTICES: &str = "bestPractices";
pub const RECOMMENDED_READING: &str = "recommendedReading";
pub const DID_YOU_KNOW: &str = "didYouKnow";

/// Top-level field names in document order.
pub const TOP_LEVEL_FIELDS: [&str; 7] = [
    TLDR,
    DEFINITION_AND_STRUCTURE,
    HISTORICAL_CONTEXT,
    USAGE_IN_APIS,
    BEST_PRACTICES,
    RECOMMENDED_READING,
    DID_YOU_KNOW,
];

fn key_value_item() -> SchemaNode {
    SchemaNode::bare(SchemaKind::Object(
        ObjectSchema::new()
            .field("key", SchemaNode::string("Short label"))
            .field("value", SchemaNode::string("Concise explanation")),
    ))
}

/// Build the complete takeaways schema.
pub fn takeaways_schema() -> ObjectSchema {
    let usage = ObjectSchema::new()
        .field(
            "tags",
            SchemaNode::list(
                SchemaNode::bare(SchemaKind::String),
                "HTTP headers, protocols or API features where the term appears",
            ),
        )
        .field(
            "description",
            SchemaNode::string("How the term is used when designing or consuming APIs"),
        );

    let reading = ObjectSchema::new()
        .field("title", SchemaNode::string("Title of the resource"))
        .field("url", SchemaNode::string("Absolute URL of the resource"));

    ObjectSchema::new()
        .field(
            TLDR,
            SchemaNode::string("A single-sentence summary of the term"),
        )
        .field(
            DEFINITION_AND_STRUCTURE,
            SchemaNode::list(key_value_item(), "Key aspects of the definition and structure"),
        )
        .field(
            HISTORICAL_CONTEXT,
            SchemaNode::list(key_value_item(), "Milestones in the history of the term"),
        )
        .field(
            USAGE_IN_APIS,
            SchemaNode::object(usage, "How the term shows up in APIs"),
        )
        .field(
            BEST_PRACTICES,
            SchemaNode::list(
                SchemaNode::bare(SchemaKind::String),
                "Actionable best practices, one sentence each",
            ),
        )
        .field(
            RECOMMENDED_READING,
            SchemaNode::list(
                SchemaNode::bare(SchemaKind::Object(reading)),
                "Authoritative resources for further reading",
            ),
        )
        .field(
            DID_YOU_KNOW,
            SchemaNode::string("A surprising fact about the term"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_all_fields_in_order() {
        assert_eq!(takeaways_schema().names(), TOP_LEVEL_FIELDS.to_vec());
    }

    #[test]
    fn fixture_validates_against_full_schema() {
        let fixture = std::fs::read_to_string(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("../../../fixtures/takeaways/mime-types.json"),
        )
        .expect("read fixture");
        let value: serde_json::Value = serde_json::from_str(&fixture).expect("parse fixture");
        takeaways_schema().validate(&value).expect("fixture matches schema");
    }

    #[test]
    fn usage_is_a_nested_object() {
        let schema = takeaways_schema();
        let usage = schema
            .get(USAGE_IN_APIS)
            .and_then(SchemaNode::as_object)
            .expect("usageInAPIs object");
        assert_eq!(usage.names(), vec!["tags", "description"]);
        assert!(schema.get(BEST_PRACTICES).is_some_and(SchemaNode::is_list));
    }
}
