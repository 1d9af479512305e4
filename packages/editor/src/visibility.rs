//! # Conditional Field Visibility
//!
//! Evaluates per-field `display_if` rules against sibling field values
//! within the same block. Rules AND together; a rule naming a missing
//! sibling, or carrying neither `equal_to` nor `not_equal_to`, is
//! vacuously satisfied. Evaluation is pure; the render pass caches the
//! result on each field as `should_display`.

use blockdoc_schema::FieldDefinition;

use crate::{BlockDocument, FieldValue, RenderBlock};

/// Evaluate a field's display rules against the current sibling values
pub fn field_should_display(block: &RenderBlock, def: &FieldDefinition) -> bool {
    let Some(rules) = &def.display_if else {
        return true;
    };

    rules.iter().all(|rule| {
        let Some(sibling) = block.fields.get(&rule.sibling) else {
            return true;
        };

        // A subblock or repeater sibling never equals a literal, even an
        // explicit null
        let scalar = sibling.value.as_scalar();

        match (&rule.equal_to, &rule.not_equal_to) {
            (Some(expected), _) => scalar.is_some_and(|current| current == expected),
            (None, Some(excluded)) => scalar.map_or(true, |current| current != excluded),
            (None, None) => true,
        }
    })
}

impl BlockDocument {
    /// The render pass: recompute and cache `should_display` on every
    /// field of every block. Idempotent; no side effects beyond the
    /// cache writes.
    pub fn refresh_visibility(&mut self) {
        for block in &mut self.blocks {
            refresh_block(block);
        }
    }
}

fn refresh_block(block: &mut RenderBlock) {
    let decisions: Vec<(String, bool)> = block
        .def
        .fields
        .iter()
        .map(|field_def| (field_def.name.clone(), field_should_display(block, field_def)))
        .collect();

    for (name, visible) in decisions {
        if let Some(field) = block.fields.get_mut(&name) {
            field.should_display = Some(visible);
        }
    }

    for field in block.fields.values_mut() {
        match &mut field.value {
            FieldValue::Block(b) => refresh_block(b),
            FieldValue::Blocks(items) => {
                for item in items {
                    refresh_block(item);
                }
            }
            FieldValue::Scalar(_) => {}
        }
    }
}
