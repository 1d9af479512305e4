//! # Blockdoc Editor
//!
//! Core block-document editing engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: block/field definitions + registry  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: render tree + mutations             │
//! │  - Build render tree from persisted data    │
//! │  - Apply mutations (add/remove/reorder)     │
//! │  - Resolve conditional field visibility     │
//! │  - Serialize back to persisted data         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: pickers, drag handles, persistence    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Render tree is session state**: the persisted document is plain
//!    data; identity (uids) exists only while editing and never persists
//! 2. **Single-threaded mutations**: each mutation is one synchronous
//!    step driven by a UI event; there are no partial states to observe
//! 3. **Stale references no-op**: the interactive surface may hold
//!    references to just-removed nodes; robustness wins over hard failure
//! 4. **Strict builds**: unresolved types and missing definitions abort a
//!    build and surface in the session's load state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blockdoc_editor::{EditSession, Mutation};
//!
//! let mut session = EditSession::new("client-1", registry);
//! session.load(&data)?;
//!
//! session.apply(Mutation::AddBlock {
//!     type_name: "paragraph".to_string(),
//!     index: Some(0),
//! })?;
//!
//! let document = session.save(&mut host)?;
//! ```

mod document;
mod errors;
mod mutations;
mod serializer;
mod session;
mod uid;
mod visibility;

pub use document::{
    BlockDocument, FieldValue, RenderBlock, RenderField, RepeaterAddress, TYPE_KEY,
};
pub use errors::EditorError;
pub use mutations::{DragLocation, Mutation, MutationOutcome, BLOCK_LIST_DROPPABLE};
pub use serializer::{serialize, serialize_block};
pub use session::{EditSession, HostInterface, LoadState};
pub use uid::UidGenerator;
pub use visibility::field_should_display;

// Re-export schema types for convenience
pub use blockdoc_schema::{
    BlockDefinition, BlockGroup, BlockRef, DisplayRule, FieldDefinition, FieldType,
    GroupSpec, SchemaError, SchemaRegistry,
};
