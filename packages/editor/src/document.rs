//! # Block Document
//!
//! Core document abstraction for blockdoc editing.
//!
//! A [`BlockDocument`] is the live render tree for one editing session:
//! the persisted plain data, rebuilt into identity-tagged nodes that the
//! interaction surface can address by uid.
//!
//! ## Lifecycle
//!
//! ```text
//! Load  →  Build   →  Edit       →  Save
//!   ↓        ↓           ↓            ↓
//! JSON   RenderBlocks  Mutations   JSON (serializer)
//! ```
//!
//! Render nodes are created only here (initial build, or block/repeater
//! inserts routed through [`crate::Mutation`]), mutated in place, and
//! destroyed only by removal from their containing sequence.

use std::collections::HashMap;
use std::sync::Arc;

use blockdoc_schema::{BlockDefinition, FieldType, SchemaRegistry};
use serde_json::Value;

use crate::{EditorError, UidGenerator};

/// Key carrying the type discriminator in persisted block records
pub const TYPE_KEY: &str = "__type";

/// A block instance in the render tree
#[derive(Debug, Clone)]
pub struct RenderBlock {
    /// Session-unique identity; stable for the node's lifetime, never
    /// reused, never persisted
    pub uid: String,

    /// Copied from the definition's discriminator
    pub type_name: String,

    /// Owning definition (shared, immutable)
    pub def: Arc<BlockDefinition>,

    /// Field name → field node. Mapping order is insignificant; declared
    /// order lives in `def.fields`.
    pub fields: HashMap<String, RenderField>,

    /// True only for members of the document's top-level sequence
    pub is_top_level: bool,
}

impl RenderBlock {
    pub fn field(&self, name: &str) -> Option<&RenderField> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut RenderField> {
        self.fields.get_mut(name)
    }

    /// Current scalar value of a field, if the field exists and is scalar
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(|f| f.value.as_scalar())
    }
}

/// A field slot within a render block
#[derive(Debug, Clone)]
pub struct RenderField {
    /// Session-unique identity; doubles as the drag/reorder key for
    /// repeater fields
    pub uid: String,

    /// Owning field definition (shared, immutable)
    pub def: Arc<blockdoc_schema::FieldDefinition>,

    pub value: FieldValue,

    /// Visibility cache, written by the render pass. `None` until the
    /// first pass; never persisted.
    pub should_display: Option<bool>,
}

impl RenderField {
    /// Whether the presentation layer should offer an add button for this
    /// repeater field: `max` unbounded, or item count below it. The
    /// mutator itself never enforces `max`.
    pub fn add_allowed(&self) -> bool {
        match &self.value {
            FieldValue::Blocks(items) => {
                self.def.max < 0 || (items.len() as i64) < self.def.max
            }
            _ => false,
        }
    }
}

/// Field payload; the shape always matches the declared field type
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Raw persisted value for scalar editor kinds (string/number/bool/null)
    Scalar(Value),

    /// Single nested block (`subblock`)
    Block(Box<RenderBlock>),

    /// Ordered nested blocks (`subblock array`); order is significant and
    /// preserved across mutation and serialization
    Blocks(Vec<RenderBlock>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&RenderBlock> {
        match self {
            FieldValue::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_blocks(&self) -> Option<&[RenderBlock]> {
        match self {
            FieldValue::Blocks(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_blocks_mut(&mut self) -> Option<&mut Vec<RenderBlock>> {
        match self {
            FieldValue::Blocks(items) => Some(items),
            _ => None,
        }
    }
}

/// Where a repeater field lives: the owning block's uid plus the field
/// name within it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeaterAddress {
    pub block_uid: String,
    pub field_name: String,
}

/// Live render tree for one editing session
#[derive(Debug)]
pub struct BlockDocument {
    /// Ordered top-level sequence
    pub blocks: Vec<RenderBlock>,

    /// Current version number (increments on each applied mutation)
    pub version: u64,

    registry: Arc<SchemaRegistry>,

    uids: UidGenerator,

    /// Repeater field uid → address. Maintained by the builder as
    /// subblock-array fields are created; routes repeater mutations
    /// without scanning for the field. Stale entries are tolerated.
    repeaters: HashMap<String, RepeaterAddress>,
}

impl BlockDocument {
    /// Create an empty document
    pub fn empty(registry: Arc<SchemaRegistry>, seed: &str) -> Self {
        Self {
            blocks: Vec::new(),
            version: 0,
            registry,
            uids: UidGenerator::new(seed),
            repeaters: HashMap::new(),
        }
    }

    /// Build the full render tree from persisted data.
    ///
    /// `data` must be an ordered array of `__type`-tagged records. Any
    /// resolution failure aborts the whole build; no partially built
    /// document escapes.
    pub fn from_data(
        registry: Arc<SchemaRegistry>,
        seed: &str,
        data: &Value,
    ) -> Result<Self, EditorError> {
        let records = data
            .as_array()
            .ok_or_else(|| EditorError::MalformedDocument {
                reason: "top-level document is not an array".to_string(),
            })?;

        let mut doc = Self::empty(registry, seed);

        for record in records {
            let type_name = record_type(record)?;
            let def = doc
                .registry
                .get(type_name)
                .ok_or_else(|| blockdoc_schema::SchemaError::UnknownBlockType {
                    type_name: type_name.to_string(),
                })?;

            let mut block = doc.build_block(&def, Some(record))?;
            block.is_top_level = true;
            doc.blocks.push(block);
        }

        tracing::debug!(
            blocks = doc.blocks.len(),
            repeaters = doc.repeaters.len(),
            "document built"
        );

        Ok(doc)
    }

    /// Build one render block from a definition and optional plain data.
    ///
    /// Walks the definition's fields in declared order. Subblocks recurse
    /// through their declared type; repeater items resolve their own
    /// `__type` tags against the registry and the field is registered in
    /// the repeater index.
    pub(crate) fn build_block(
        &mut self,
        def: &Arc<BlockDefinition>,
        data: Option<&Value>,
    ) -> Result<RenderBlock, EditorError> {
        let registry = self.registry.clone();
        let uid = self.uids.new_uid();
        let mut fields = HashMap::with_capacity(def.fields.len());

        for field_def in &def.fields {
            let field_uid = self.uids.new_uid();
            let data_value = data.and_then(|d| d.get(&field_def.name));

            let value = match field_def.field_type {
                FieldType::Subblock => {
                    let block_ref = field_def.subblock_type.as_ref().ok_or_else(|| {
                        EditorError::MissingFieldDefinition {
                            block: def.type_name.clone(),
                            field: field_def.name.clone(),
                        }
                    })?;
                    let sub_def = registry.resolve(block_ref)?;
                    FieldValue::Block(Box::new(self.build_block(&sub_def, data_value)?))
                }

                FieldType::SubblockArray => {
                    let records: &[Value] = match data_value {
                        Some(Value::Array(items)) => items.as_slice(),
                        _ => &[],
                    };

                    let mut items = Vec::with_capacity(records.len());
                    for record in records {
                        let type_name = record_type(record)?;
                        let sub_def = registry.get(type_name).ok_or_else(|| {
                            blockdoc_schema::SchemaError::UnknownBlockType {
                                type_name: type_name.to_string(),
                            }
                        })?;
                        items.push(self.build_block(&sub_def, Some(record))?);
                    }

                    self.repeaters.insert(
                        field_uid.clone(),
                        RepeaterAddress {
                            block_uid: uid.clone(),
                            field_name: field_def.name.clone(),
                        },
                    );

                    FieldValue::Blocks(items)
                }

                _ => FieldValue::Scalar(data_value.cloned().unwrap_or(Value::Null)),
            };

            fields.insert(
                field_def.name.clone(),
                RenderField {
                    uid: field_uid,
                    def: Arc::new(field_def.clone()),
                    value,
                    should_display: None,
                },
            );
        }

        Ok(RenderBlock {
            uid,
            type_name: def.type_name.clone(),
            def: def.clone(),
            fields,
            is_top_level: false,
        })
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Find a block anywhere in the tree by uid
    pub fn find_block(&self, uid: &str) -> Option<&RenderBlock> {
        self.blocks.iter().find_map(|b| find_in_block(b, uid))
    }

    /// Find a block anywhere in the tree by uid, mutably
    pub fn find_block_mut(&mut self, uid: &str) -> Option<&mut RenderBlock> {
        self.blocks
            .iter_mut()
            .find_map(|b| find_in_block_mut(b, uid))
    }

    pub fn repeater_address(&self, repeater_uid: &str) -> Option<&RepeaterAddress> {
        self.repeaters.get(repeater_uid)
    }

    /// The live field node behind a repeater uid, if its owner still exists
    pub fn repeater_field(&self, repeater_uid: &str) -> Option<&RenderField> {
        let address = self.repeaters.get(repeater_uid)?;
        self.find_block(&address.block_uid)?
            .field(&address.field_name)
    }

    /// Whether the add button should show for a repeater, per its `max`.
    /// `None` when the uid is stale.
    pub fn can_add_item(&self, repeater_uid: &str) -> Option<bool> {
        self.repeater_field(repeater_uid).map(RenderField::add_allowed)
    }

    /// Total number of render blocks in the tree
    pub fn node_count(&self) -> usize {
        fn count(block: &RenderBlock) -> usize {
            1 + block
                .fields
                .values()
                .map(|f| match &f.value {
                    FieldValue::Block(b) => count(b),
                    FieldValue::Blocks(items) => items.iter().map(count).sum(),
                    FieldValue::Scalar(_) => 0,
                })
                .sum::<usize>()
        }
        self.blocks.iter().map(count).sum()
    }

    /// Every block and field uid in the tree
    pub fn all_uids(&self) -> Vec<String> {
        fn collect(block: &RenderBlock, out: &mut Vec<String>) {
            out.push(block.uid.clone());
            for field in block.fields.values() {
                out.push(field.uid.clone());
                match &field.value {
                    FieldValue::Block(b) => collect(b, out),
                    FieldValue::Blocks(items) => {
                        for item in items {
                            collect(item, out);
                        }
                    }
                    FieldValue::Scalar(_) => {}
                }
            }
        }

        let mut out = Vec::new();
        for block in &self.blocks {
            collect(block, &mut out);
        }
        out
    }
}

/// Extract the `__type` discriminator from a plain block record
pub(crate) fn record_type(record: &Value) -> Result<&str, EditorError> {
    let object = record
        .as_object()
        .ok_or_else(|| EditorError::MalformedDocument {
            reason: "block record is not an object".to_string(),
        })?;

    object
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or(EditorError::MissingTypeTag)
}

fn find_in_block<'a>(block: &'a RenderBlock, uid: &str) -> Option<&'a RenderBlock> {
    if block.uid == uid {
        return Some(block);
    }

    block.fields.values().find_map(|f| match &f.value {
        FieldValue::Block(b) => find_in_block(b, uid),
        FieldValue::Blocks(items) => items.iter().find_map(|b| find_in_block(b, uid)),
        FieldValue::Scalar(_) => None,
    })
}

fn find_in_block_mut<'a>(block: &'a mut RenderBlock, uid: &str) -> Option<&'a mut RenderBlock> {
    if block.uid == uid {
        return Some(block);
    }

    block.fields.values_mut().find_map(|f| match &mut f.value {
        FieldValue::Block(b) => find_in_block_mut(b, uid),
        FieldValue::Blocks(items) => items.iter_mut().find_map(|b| find_in_block_mut(b, uid)),
        FieldValue::Scalar(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_registry() -> Arc<SchemaRegistry> {
        let defs: Vec<BlockDefinition> = serde_json::from_value(json!([
            {
                "type": "paragraph",
                "fields": [
                    {"name": "content", "type": "textarea"},
                ],
            },
            {
                "type": "gallery",
                "fields": [
                    {"name": "title", "type": "text"},
                    {
                        "name": "images",
                        "type": "subblock array",
                        "nested_block_types": ["image"],
                    },
                ],
            },
            {
                "type": "image",
                "fields": [
                    {"name": "url", "type": "text"},
                    {"name": "caption", "type": "text"},
                ],
            },
        ]))
        .unwrap();

        Arc::new(SchemaRegistry::from_definitions(defs))
    }

    #[test]
    fn test_build_simple_document() {
        let data = json!([
            {"__type": "paragraph", "content": "hi"},
        ]);

        let doc = BlockDocument::from_data(test_registry(), "s", &data).unwrap();

        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.blocks[0].is_top_level);
        assert_eq!(doc.blocks[0].type_name, "paragraph");
        assert_eq!(
            doc.blocks[0].scalar("content"),
            Some(&Value::String("hi".to_string()))
        );
    }

    #[test]
    fn test_absent_scalar_fields_are_null() {
        let data = json!([{"__type": "paragraph"}]);
        let doc = BlockDocument::from_data(test_registry(), "s", &data).unwrap();

        assert_eq!(doc.blocks[0].scalar("content"), Some(&Value::Null));
    }

    #[test]
    fn test_repeater_items_registered_and_ordered() {
        let data = json!([
            {
                "__type": "gallery",
                "title": "Trip",
                "images": [
                    {"__type": "image", "url": "a.jpg"},
                    {"__type": "image", "url": "b.jpg"},
                ],
            },
        ]);

        let doc = BlockDocument::from_data(test_registry(), "s", &data).unwrap();

        let field = doc.blocks[0].field("images").unwrap();
        let items = field.value.as_blocks().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].scalar("url"), Some(&json!("a.jpg")));
        assert_eq!(items[1].scalar("url"), Some(&json!("b.jpg")));
        assert!(!items[0].is_top_level);

        // Field is routable through the repeater index
        let address = doc.repeater_address(&field.uid).unwrap();
        assert_eq!(address.block_uid, doc.blocks[0].uid);
        assert_eq!(address.field_name, "images");
    }

    #[test]
    fn test_unknown_type_aborts_build() {
        let data = json!([{"__type": "mystery"}]);
        let err = BlockDocument::from_data(test_registry(), "s", &data).unwrap_err();

        assert_eq!(
            err,
            EditorError::Schema(blockdoc_schema::SchemaError::UnknownBlockType {
                type_name: "mystery".to_string()
            })
        );
    }

    #[test]
    fn test_missing_type_tag_aborts_build() {
        let data = json!([{"content": "untagged"}]);
        let err = BlockDocument::from_data(test_registry(), "s", &data).unwrap_err();
        assert_eq!(err, EditorError::MissingTypeTag);

        let nested = json!([
            {"__type": "gallery", "images": [{"url": "a.jpg"}]},
        ]);
        let err = BlockDocument::from_data(test_registry(), "s", &nested).unwrap_err();
        assert_eq!(err, EditorError::MissingTypeTag);
    }

    #[test]
    fn test_unknown_keys_in_records_are_ignored() {
        let data = json!([
            {"__type": "paragraph", "content": "hi", "stray": 42},
        ]);

        let doc = BlockDocument::from_data(test_registry(), "s", &data).unwrap();
        assert!(doc.blocks[0].field("stray").is_none());
    }

    #[test]
    fn test_find_block_reaches_nested_items() {
        let data = json!([
            {
                "__type": "gallery",
                "images": [{"__type": "image", "url": "a.jpg"}],
            },
        ]);

        let mut doc = BlockDocument::from_data(test_registry(), "s", &data).unwrap();
        let item_uid = doc.blocks[0].field("images").unwrap().value.as_blocks().unwrap()[0]
            .uid
            .clone();

        assert!(doc.find_block(&item_uid).is_some());
        assert!(doc.find_block_mut(&item_uid).is_some());
        assert!(doc.find_block("nope").is_none());
    }

    #[test]
    fn test_all_uids_are_distinct() {
        let data = json!([
            {
                "__type": "gallery",
                "title": "t",
                "images": [
                    {"__type": "image", "url": "a.jpg"},
                    {"__type": "image", "url": "b.jpg"},
                ],
            },
            {"__type": "paragraph", "content": "hi"},
        ]);

        let doc = BlockDocument::from_data(test_registry(), "s", &data).unwrap();
        let mut uids = doc.all_uids();
        let total = uids.len();
        uids.sort();
        uids.dedup();
        assert_eq!(uids.len(), total);
    }
}
