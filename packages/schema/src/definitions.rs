use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Schema for one block type: its discriminator and ordered field list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Unique type discriminator, matched against `__type` tags in data
    #[serde(rename = "type")]
    pub type_name: String,

    /// Human-readable label for pickers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Preview image URL for pickers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    /// Ordered field definitions
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl BlockDefinition {
    /// Look up a field definition by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One named slot within a block definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique within the owning block definition
    pub name: String,

    /// Editor kind, or structural nesting
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Definition of the nested block, required for `Subblock` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subblock_type: Option<BlockRef>,

    /// Allowed item types for `SubblockArray` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_block_types: Vec<BlockRef>,

    /// Item cap for `SubblockArray` fields; -1 = unbounded
    #[serde(default = "unbounded")]
    pub max: i64,

    /// Conditional-display rules; all must hold for the field to show
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_if: Option<Vec<DisplayRule>>,
}

fn unbounded() -> i64 {
    -1
}

/// Field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "text")]
    Text,

    #[serde(rename = "textarea")]
    TextArea,

    #[serde(rename = "richtext")]
    RichText,

    #[serde(rename = "number")]
    Number,

    #[serde(rename = "toggle")]
    Toggle,

    #[serde(rename = "select")]
    Select,

    /// A single nested block
    #[serde(rename = "subblock")]
    Subblock,

    /// An ordered sequence of nested blocks (a repeater)
    #[serde(rename = "subblock array")]
    SubblockArray,
}

impl FieldType {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Subblock | FieldType::SubblockArray)
    }

    pub fn is_subblock(&self) -> bool {
        matches!(self, FieldType::Subblock)
    }

    pub fn is_subblock_array(&self) -> bool {
        matches!(self, FieldType::SubblockArray)
    }
}

/// Reference to a block definition: a registry name or an inline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockRef {
    Named(String),
    Inline(Box<BlockDefinition>),
}

/// One conditional-display rule, evaluated against a sibling field's value.
///
/// `equal_to` and `not_equal_to` distinguish an absent key from an explicit
/// null: a rule carrying neither is vacuously satisfied, a rule carrying
/// `equal_to: null` requires the sibling to be null. When both are present,
/// `equal_to` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRule {
    /// Name of the sibling field to compare against
    pub sibling: String,

    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub equal_to: Option<Value>,

    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub not_equal_to: Option<Value>,
}

// A present key deserializes to Some even when its value is null; only an
// absent key falls back to the None default.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_definition_from_json() {
        let def: BlockDefinition = serde_json::from_value(json!({
            "type": "quote",
            "description": "Pull quote",
            "fields": [
                {"name": "text", "type": "textarea"},
                {"name": "cite", "type": "text"},
            ],
        }))
        .unwrap();

        assert_eq!(def.type_name, "quote");
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[0].field_type, FieldType::TextArea);
        assert!(def.field("cite").is_some());
        assert!(def.field("missing").is_none());
    }

    #[test]
    fn test_subblock_array_field_defaults() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "name": "items",
            "type": "subblock array",
            "nested_block_types": ["quote"],
        }))
        .unwrap();

        assert_eq!(field.field_type, FieldType::SubblockArray);
        assert_eq!(field.max, -1);
        assert_eq!(field.nested_block_types, vec![BlockRef::Named("quote".to_string())]);
    }

    #[test]
    fn test_block_ref_accepts_inline_definitions() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "name": "header",
            "type": "subblock",
            "subblock_type": {
                "type": "header",
                "fields": [{"name": "title", "type": "text"}],
            },
        }))
        .unwrap();

        match field.subblock_type {
            Some(BlockRef::Inline(def)) => assert_eq!(def.type_name, "header"),
            other => panic!("expected inline ref, got {:?}", other),
        }
    }

    #[test]
    fn test_display_rule_distinguishes_absent_from_null() {
        let absent: DisplayRule =
            serde_json::from_value(json!({"sibling": "kind"})).unwrap();
        assert!(absent.equal_to.is_none());
        assert!(absent.not_equal_to.is_none());

        let null_eq: DisplayRule =
            serde_json::from_value(json!({"sibling": "kind", "equal_to": null})).unwrap();
        assert_eq!(null_eq.equal_to, Some(Value::Null));
    }
}
