//! Read-only lookup from block-type name to definition

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{BlockDefinition, BlockRef, FieldDefinition, SchemaError};

/// Registry of block definitions for one editing session.
///
/// Populated once from host-supplied definitions, then consulted read-only
/// by the render-tree builder and mutations. Shared via `Arc`.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    blocks: HashMap<String, Arc<BlockDefinition>>,
    groups: HashMap<String, BlockGroup>,
}

/// Host-supplied picker grouping: a display name plus member type names,
/// resolved into a [`BlockGroup`] by [`SchemaRegistry::set_groups`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Member block-type names, in picker order
    pub members: Vec<String>,
}

/// Picker-ready grouping: display metadata plus the full member
/// definitions, so pickers can read `type`/`description`/`thumbnail`
/// directly. Carried for the presentation layer; the editing core never
/// consults it.
#[derive(Debug, Clone)]
pub struct BlockGroup {
    /// Display name; pickers fall back to the group key when absent
    pub name: Option<String>,

    /// Member block definitions, in picker order
    pub members: Vec<Arc<BlockDefinition>>,
}

impl BlockGroup {
    /// Display name, falling back to the group key
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = BlockDefinition>) -> Self {
        let mut registry = Self::new();
        for def in definitions {
            registry.insert(def);
        }
        registry
    }

    pub fn insert(&mut self, definition: BlockDefinition) {
        self.blocks
            .insert(definition.type_name.clone(), Arc::new(definition));
    }

    /// Look up a definition by type name
    pub fn get(&self, type_name: &str) -> Option<Arc<BlockDefinition>> {
        self.blocks.get(type_name).cloned()
    }

    /// Resolve a reference to a shared definition. Named misses are
    /// `UnknownBlockType`.
    pub fn resolve(&self, block_ref: &BlockRef) -> Result<Arc<BlockDefinition>, SchemaError> {
        match block_ref {
            BlockRef::Named(name) => {
                self.get(name).ok_or_else(|| SchemaError::UnknownBlockType {
                    type_name: name.clone(),
                })
            }
            BlockRef::Inline(def) => Ok(Arc::new((**def).clone())),
        }
    }

    /// Resolve every allowed item type of a repeater field, collecting the
    /// indices of entries that do not name a valid definition.
    pub fn resolve_nested_types(
        &self,
        field: &FieldDefinition,
    ) -> Result<Vec<Arc<BlockDefinition>>, SchemaError> {
        let mut resolved = Vec::with_capacity(field.nested_block_types.len());
        let mut invalid = Vec::new();

        for (index, block_ref) in field.nested_block_types.iter().enumerate() {
            match self.resolve(block_ref) {
                Ok(def) if !def.type_name.is_empty() => resolved.push(def),
                _ => invalid.push(index),
            }
        }

        if invalid.is_empty() {
            Ok(resolved)
        } else {
            Err(SchemaError::InvalidNestedBlockTypes { indices: invalid })
        }
    }

    /// Install picker groupings, resolving member type names against the
    /// registered definitions. Members naming no registered definition
    /// are dropped.
    pub fn set_groups(&mut self, specs: HashMap<String, GroupSpec>) {
        let groups = specs
            .into_iter()
            .map(|(key, spec)| {
                let members = spec
                    .members
                    .iter()
                    .filter_map(|type_name| self.blocks.get(type_name).cloned())
                    .collect();
                (
                    key,
                    BlockGroup {
                        name: spec.name,
                        members,
                    },
                )
            })
            .collect();

        self.groups = groups;
    }

    pub fn groups(&self) -> &HashMap<String, BlockGroup> {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
