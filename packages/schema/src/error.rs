//! Error types for schema resolution

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A type discriminator has no entry in the registry. Fatal to the
    /// build or mutation it occurs in.
    #[error("Unknown block type: {type_name}")]
    UnknownBlockType { type_name: String },

    /// One or more `nested_block_types` entries of a repeater field do not
    /// resolve to a valid block definition. Recoverable: reported to the
    /// presentation layer, never aborts the session.
    #[error("Invalid nested_block_types entries at indexes {indices:?}")]
    InvalidNestedBlockTypes { indices: Vec<usize> },
}

impl SchemaError {
    /// User-facing message for inline diagnostic panels
    pub fn user_message(&self) -> String {
        match self {
            SchemaError::UnknownBlockType { type_name } => {
                format!("Unknown block type “{}”", type_name)
            }
            SchemaError::InvalidNestedBlockTypes { indices } => {
                let multiple = indices.len() > 1;
                let joined = indices
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!(
                    "Error: the nested_block_types {} at {} {} {} invalid",
                    if multiple { "values" } else { "value" },
                    if multiple { "indexes" } else { "index" },
                    joined,
                    if multiple { "were" } else { "was" },
                )
            }
        }
    }
}
