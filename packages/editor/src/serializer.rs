//! # Serializer
//!
//! Render tree → plain persisted data: the inverse of the builder.
//!
//! For each block the serializer walks the definition's fields in
//! declared order and emits:
//! - subblocks as recursively serialized records
//! - repeater sequences as ordered arrays of records
//! - scalars as the raw stored value
//!
//! Fields whose value is null or the empty string are omitted to keep the
//! persisted form minimal; fields hidden by their display rules are
//! omitted regardless of stored value (hidden state is authoritative for
//! persistence, evaluated against current sibling values). Every record
//! is stamped with its `__type` discriminator; uids never appear.

use serde_json::{Map, Value};

use crate::{visibility, BlockDocument, FieldValue, RenderBlock, TYPE_KEY};

/// Serialize the full document to its plain persisted form
pub fn serialize(doc: &BlockDocument) -> Value {
    Value::Array(doc.blocks.iter().map(serialize_block).collect())
}

/// Serialize one block to a `__type`-tagged record
pub fn serialize_block(block: &RenderBlock) -> Value {
    let mut record = Map::new();

    for field_def in &block.def.fields {
        let Some(field) = block.fields.get(&field_def.name) else {
            continue;
        };

        if !visibility::field_should_display(block, field_def) {
            continue;
        }

        let value = match &field.value {
            FieldValue::Block(sub) => serialize_block(sub),
            FieldValue::Blocks(items) => {
                Value::Array(items.iter().map(serialize_block).collect())
            }
            FieldValue::Scalar(raw) => raw.clone(),
        };

        if is_droppable(&value) {
            continue;
        }

        record.insert(field_def.name.clone(), value);
    }

    record.insert(
        TYPE_KEY.to_string(),
        Value::String(block.def.type_name.clone()),
    );

    Value::Object(record)
}

// Empty string and null are dropped; empty arrays survive (an emptied
// repeater is still a repeater).
fn is_droppable(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockdoc_schema::{BlockDefinition, SchemaRegistry};
    use serde_json::json;
    use std::sync::Arc;

    fn registry() -> Arc<SchemaRegistry> {
        let defs: Vec<BlockDefinition> = serde_json::from_value(json!([
            {
                "type": "card",
                "fields": [
                    {"name": "title", "type": "text"},
                    {"name": "note", "type": "textarea"},
                    {
                        "name": "links",
                        "type": "subblock array",
                        "nested_block_types": ["link"],
                    },
                ],
            },
            {
                "type": "link",
                "fields": [
                    {"name": "href", "type": "text"},
                ],
            },
        ]))
        .unwrap();

        Arc::new(SchemaRegistry::from_definitions(defs))
    }

    #[test]
    fn test_round_trips_plain_data() {
        let data = json!([
            {
                "__type": "card",
                "title": "Hello",
                "links": [
                    {"__type": "link", "href": "https://a"},
                    {"__type": "link", "href": "https://b"},
                ],
            },
        ]);

        let doc = BlockDocument::from_data(registry(), "s", &data).unwrap();
        assert_eq!(serialize(&doc), data);
    }

    #[test]
    fn test_drops_null_and_empty_string_fields() {
        let data = json!([
            {"__type": "card", "title": "", "note": null, "links": []},
        ]);

        let doc = BlockDocument::from_data(registry(), "s", &data).unwrap();
        assert_eq!(serialize(&doc), json!([{"__type": "card", "links": []}]));
    }

    #[test]
    fn test_empty_repeater_survives() {
        let data = json!([{"__type": "card", "title": "t"}]);
        let doc = BlockDocument::from_data(registry(), "s", &data).unwrap();

        // Absent on input builds as an empty sequence, which persists
        assert_eq!(
            serialize(&doc),
            json!([{"__type": "card", "title": "t", "links": []}])
        );
    }

    #[test]
    fn test_never_emits_uids() {
        let data = json!([{"__type": "card", "title": "t"}]);
        let doc = BlockDocument::from_data(registry(), "s", &data).unwrap();

        let out = serde_json::to_string(&serialize(&doc)).unwrap();
        assert!(!out.contains("uid"));
    }
}
