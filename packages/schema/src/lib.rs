//! # Blockdoc Schema
//!
//! Block and field definitions for the blockdoc editing core.
//!
//! A schema is supplied once per editing session as plain data: an ordered
//! set of [`BlockDefinition`]s, each declaring the fields a block of that
//! type carries. Definitions are immutable for the lifetime of the session
//! and are consulted, never mutated, by the render-tree builder.
//!
//! ## Core Principles
//!
//! 1. **Schema is data**: definitions round-trip through serde, so hosts
//!    can ship them as JSON alongside the documents they describe
//! 2. **Closed field kinds**: [`FieldType`] is a closed enumeration,
//!    dispatched by pattern match
//! 3. **Registry is read-only**: lookups resolve type names to shared
//!    definitions; a miss is a structured error, never a silent skip

mod definitions;
mod error;
mod registry;

pub use definitions::{BlockDefinition, BlockRef, DisplayRule, FieldDefinition, FieldType};
pub use error::SchemaError;
pub use registry::{BlockGroup, GroupSpec, SchemaRegistry};
