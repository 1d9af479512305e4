//! Error types for the editor

use blockdoc_schema::SchemaError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A field has no usable definition (e.g. a subblock field without a
    /// `subblock_type`). Strict build failure; never skipped.
    #[error("Missing field definition: {block}.{field}")]
    MissingFieldDefinition { block: String, field: String },

    /// A block record carries no string `__type` tag, so it cannot be
    /// resolved against the registry
    #[error("Block record has no __type tag")]
    MissingTypeTag,

    #[error("Malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// A field-value update was aimed at a subblock or repeater field
    #[error("Field is not a scalar: {field}")]
    NotAScalarField { field: String },

    /// A session operation requires a loaded document
    #[error("No document is loaded")]
    NotLoaded,
}
