//! # Tree Mutations
//!
//! High-level semantic operations on block documents.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: each mutation represents one user gesture
//! 2. **All-or-nothing**: a mutation applies completely or not at all
//! 3. **Stale references no-op**: a mutation naming a uid that no longer
//!    exists leaves the tree untouched rather than failing — a queued
//!    callback may reference a just-removed item
//!
//! ## Mutation Semantics
//!
//! ### AddBlock / AddRepeaterItem
//! - Build a fresh node with null data via the document's builder
//! - An unknown *requested* type is an error, not a stale reference:
//!   the type was never in the registry, so the caller's schema is wrong
//! - `AddRepeaterItem` does not enforce the field's `max`; the
//!   presentation gates the add button instead
//!
//! ### Reorder
//! - Same-container index permutation only, for the top-level sequence
//!   (droppable id [`BLOCK_LIST_DROPPABLE`]) or one repeater sequence
//!   (droppable id = repeater field uid)
//! - Cross-container moves, absent destinations, and source == destination
//!   are no-ops

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BlockDocument, EditorError, FieldValue};

/// Droppable id designating the document's top-level block sequence
pub const BLOCK_LIST_DROPPABLE: &str = "d-blocks";

/// One endpoint of a drag gesture: a container id plus an index within it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    #[serde(rename = "droppableId")]
    pub droppable_id: String,
    pub index: usize,
}

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a fresh null-data block into the top-level sequence
    AddBlock {
        type_name: String,
        /// Insertion index; append when absent
        index: Option<usize>,
    },

    /// Remove a top-level block by uid
    RemoveBlock { block_uid: String },

    /// Append a fresh null-data item to a repeater's sequence
    AddRepeaterItem {
        repeater_uid: String,
        type_name: String,
    },

    /// Remove one item from a repeater's sequence
    RemoveRepeaterItem {
        repeater_uid: String,
        item_uid: String,
    },

    /// Move an item within one container (drag-end gesture)
    Reorder {
        source: DragLocation,
        /// Absent when the drag ended outside any droppable
        destination: Option<DragLocation>,
    },

    /// Replace the stored value of a scalar field
    UpdateField {
        block_uid: String,
        field_name: String,
        value: Value,
    },
}

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Document version after the apply
    pub version: u64,

    /// Whether the tree changed (false for stale-reference no-ops)
    pub changed: bool,
}

impl Mutation {
    /// Apply this mutation to a document.
    ///
    /// Structural failures (unknown requested type, non-scalar update
    /// target) return an error with the tree untouched; stale references
    /// report `changed: false`.
    pub fn apply(&self, doc: &mut BlockDocument) -> Result<MutationOutcome, EditorError> {
        let changed = match self {
            Mutation::AddBlock { type_name, index } => Self::apply_add_block(doc, type_name, *index)?,

            Mutation::RemoveBlock { block_uid } => Self::apply_remove_block(doc, block_uid),

            Mutation::AddRepeaterItem {
                repeater_uid,
                type_name,
            } => Self::apply_add_repeater_item(doc, repeater_uid, type_name)?,

            Mutation::RemoveRepeaterItem {
                repeater_uid,
                item_uid,
            } => Self::apply_remove_repeater_item(doc, repeater_uid, item_uid),

            Mutation::Reorder {
                source,
                destination,
            } => Self::apply_reorder(doc, source, destination.as_ref()),

            Mutation::UpdateField {
                block_uid,
                field_name,
                value,
            } => Self::apply_update_field(doc, block_uid, field_name, value)?,
        };

        if changed {
            doc.version += 1;
        }

        Ok(MutationOutcome {
            version: doc.version,
            changed,
        })
    }

    fn apply_add_block(
        doc: &mut BlockDocument,
        type_name: &str,
        index: Option<usize>,
    ) -> Result<bool, EditorError> {
        let def = doc.registry().get(type_name).ok_or_else(|| {
            blockdoc_schema::SchemaError::UnknownBlockType {
                type_name: type_name.to_string(),
            }
        })?;

        let mut block = doc.build_block(&def, None)?;
        block.is_top_level = true;

        match index {
            Some(i) => {
                let insert_index = i.min(doc.blocks.len());
                doc.blocks.insert(insert_index, block);
            }
            None => doc.blocks.push(block),
        }

        Ok(true)
    }

    fn apply_remove_block(doc: &mut BlockDocument, block_uid: &str) -> bool {
        let Some(position) = doc.blocks.iter().position(|b| b.uid == block_uid) else {
            tracing::debug!(block_uid, "remove_block: stale uid, no-op");
            return false;
        };

        doc.blocks.remove(position);
        true
    }

    fn apply_add_repeater_item(
        doc: &mut BlockDocument,
        repeater_uid: &str,
        type_name: &str,
    ) -> Result<bool, EditorError> {
        let Some(address) = doc.repeater_address(repeater_uid).cloned() else {
            tracing::debug!(repeater_uid, "add_repeater_item: stale repeater uid, no-op");
            return Ok(false);
        };

        let def = doc.registry().get(type_name).ok_or_else(|| {
            blockdoc_schema::SchemaError::UnknownBlockType {
                type_name: type_name.to_string(),
            }
        })?;

        // Confirm the owner survives before allocating the new node
        if doc.find_block(&address.block_uid).is_none() {
            tracing::debug!(repeater_uid, "add_repeater_item: owner removed, no-op");
            return Ok(false);
        }

        let item = doc.build_block(&def, None)?;

        let Some(items) = repeater_items_mut(doc, &address.block_uid, &address.field_name) else {
            return Ok(false);
        };

        items.push(item);
        Ok(true)
    }

    fn apply_remove_repeater_item(
        doc: &mut BlockDocument,
        repeater_uid: &str,
        item_uid: &str,
    ) -> bool {
        let Some(address) = doc.repeater_address(repeater_uid).cloned() else {
            tracing::debug!(repeater_uid, "remove_repeater_item: stale repeater uid, no-op");
            return false;
        };

        let Some(items) = repeater_items_mut(doc, &address.block_uid, &address.field_name) else {
            return false;
        };

        let before = items.len();
        items.retain(|item| item.uid != item_uid);

        if items.len() == before {
            tracing::debug!(item_uid, "remove_repeater_item: stale item uid, no-op");
        }
        items.len() != before
    }

    fn apply_reorder(
        doc: &mut BlockDocument,
        source: &DragLocation,
        destination: Option<&DragLocation>,
    ) -> bool {
        let Some(destination) = destination else {
            return false;
        };

        if source.droppable_id != destination.droppable_id {
            tracing::debug!(
                source = %source.droppable_id,
                destination = %destination.droppable_id,
                "reorder: cross-container move unsupported, no-op"
            );
            return false;
        }

        if source.index == destination.index {
            return false;
        }

        if source.droppable_id == BLOCK_LIST_DROPPABLE {
            return reorder_in_place(&mut doc.blocks, source.index, destination.index);
        }

        // Anything else is matched against the repeater index
        let Some(address) = doc.repeater_address(&source.droppable_id).cloned() else {
            tracing::debug!(
                droppable_id = %source.droppable_id,
                "reorder: unknown container, no-op"
            );
            return false;
        };

        let Some(items) = repeater_items_mut(doc, &address.block_uid, &address.field_name) else {
            return false;
        };

        reorder_in_place(items, source.index, destination.index)
    }

    fn apply_update_field(
        doc: &mut BlockDocument,
        block_uid: &str,
        field_name: &str,
        value: &Value,
    ) -> Result<bool, EditorError> {
        let Some(block) = doc.find_block_mut(block_uid) else {
            tracing::debug!(block_uid, "update_field: stale block uid, no-op");
            return Ok(false);
        };

        let Some(field) = block.fields.get_mut(field_name) else {
            tracing::debug!(block_uid, field_name, "update_field: unknown field, no-op");
            return Ok(false);
        };

        if !field.def.field_type.is_scalar() {
            return Err(EditorError::NotAScalarField {
                field: field_name.to_string(),
            });
        }

        field.value = FieldValue::Scalar(value.clone());
        Ok(true)
    }
}

/// Locate a repeater's item sequence through its address
fn repeater_items_mut<'a>(
    doc: &'a mut BlockDocument,
    block_uid: &str,
    field_name: &str,
) -> Option<&'a mut Vec<crate::RenderBlock>> {
    doc.find_block_mut(block_uid)?
        .fields
        .get_mut(field_name)?
        .value
        .as_blocks_mut()
}

/// Splice `from` out and reinsert at `to`, clamped to the new length
fn reorder_in_place<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }

    let item = items.remove(from);
    let insert_index = to.min(items.len());
    items.insert(insert_index, item);
    true
}
