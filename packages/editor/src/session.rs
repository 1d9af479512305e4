//! # Edit Session Management
//!
//! Tracks the lifecycle around one document: load state, the live render
//! tree, the redraw flag, and the save path back to the host.
//!
//! The session is the capability handle the interaction surface holds:
//! every tree mutation goes through [`EditSession::apply`], and the host
//! receives the serialized document through its [`HostInterface`] on
//! save. Rendering is gated on [`LoadState`]; `Error` and `NoData` are
//! terminal until a fresh [`EditSession::load`].

use std::sync::Arc;

use blockdoc_schema::{BlockDefinition, SchemaError, SchemaRegistry};
use serde_json::Value;

use crate::{serializer, BlockDocument, EditorError, Mutation, MutationOutcome};

/// Presentation gate for the editing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Data retrieval in flight; nothing to render yet
    Loading,

    /// The host had no document to edit; terminal until a fresh load
    NoData,

    /// The build failed; terminal until a fresh load
    Error,

    /// Live render tree available
    Loaded,
}

/// Host-side capability: receives the serialized document on save. The
/// host owns transport and persistence.
pub trait HostInterface {
    fn on_update(&mut self, document: &Value);
}

/// One editing session: a document, its registry handle, and its
/// presentation state
pub struct EditSession {
    /// Session identifier; doubles as the uid seed
    pub id: String,

    registry: Arc<SchemaRegistry>,
    state: LoadState,
    document: Option<BlockDocument>,
    load_error: Option<EditorError>,
    needs_redraw: bool,
}

impl EditSession {
    /// Create a session awaiting data
    pub fn new(id: impl Into<String>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            id: id.into(),
            registry,
            state: LoadState::Loading,
            document: None,
            load_error: None,
            needs_redraw: false,
        }
    }

    /// Build the render tree from host-supplied data.
    ///
    /// Success transitions to `Loaded`; a build failure transitions to
    /// `Error` with the failure retained for display, never swallowed.
    pub fn load(&mut self, data: &Value) -> Result<(), EditorError> {
        match BlockDocument::from_data(self.registry.clone(), &self.id, data) {
            Ok(doc) => {
                self.document = Some(doc);
                self.load_error = None;
                self.state = LoadState::Loaded;
                self.needs_redraw = true;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "document load failed");
                self.document = None;
                self.load_error = Some(err.clone());
                self.state = LoadState::Error;
                Err(err)
            }
        }
    }

    /// The host determined there is no document to edit
    pub fn mark_no_data(&mut self) {
        self.document = None;
        self.load_error = None;
        self.state = LoadState::NoData;
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// The retained build failure, when in the `Error` state
    pub fn load_error(&self) -> Option<&EditorError> {
        self.load_error.as_ref()
    }

    pub fn document(&self) -> Option<&BlockDocument> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut BlockDocument> {
        self.document.as_mut()
    }

    /// Apply a mutation to the loaded document and flag a redraw if the
    /// tree changed
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome, EditorError> {
        let doc = self.document.as_mut().ok_or(EditorError::NotLoaded)?;
        let outcome = mutation.apply(doc)?;

        if outcome.changed {
            self.request_redraw();
        }

        Ok(outcome)
    }

    /// Flag that presentation state must refresh. Idempotent; the host's
    /// render scheduler may coalesce consecutive requests.
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Consume the redraw flag
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Serialize the document (visibility authoritative) and hand it to
    /// the host for persistence
    pub fn save(&mut self, host: &mut dyn HostInterface) -> Result<Value, EditorError> {
        let doc = self.document.as_mut().ok_or(EditorError::NotLoaded)?;

        doc.refresh_visibility();
        let data = serializer::serialize(doc);
        host.on_update(&data);

        Ok(data)
    }

    /// Add-button gate for a repeater; `None` when the uid is stale
    pub fn can_add_item(&self, repeater_uid: &str) -> Option<bool> {
        self.document.as_ref()?.can_add_item(repeater_uid)
    }

    /// Resolve the allowed item types of a repeater for its picker.
    /// `Err` carries the structured invalid-entries diagnostic for the
    /// inline error panel.
    pub fn repeater_types(
        &self,
        repeater_uid: &str,
    ) -> Option<Result<Vec<Arc<BlockDefinition>>, SchemaError>> {
        let doc = self.document.as_ref()?;
        let field = doc.repeater_field(repeater_uid)?;
        Some(self.registry.resolve_nested_types(&field.def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Arc<SchemaRegistry> {
        let defs: Vec<BlockDefinition> = serde_json::from_value(json!([
            {
                "type": "note",
                "fields": [{"name": "body", "type": "textarea"}],
            },
        ]))
        .unwrap();

        Arc::new(SchemaRegistry::from_definitions(defs))
    }

    #[test]
    fn test_session_starts_loading() {
        let session = EditSession::new("client-1", registry());

        assert_eq!(session.state(), LoadState::Loading);
        assert!(session.document().is_none());
        assert!(!session.needs_redraw());
    }

    #[test]
    fn test_load_success_transitions_to_loaded() {
        let mut session = EditSession::new("client-1", registry());

        session
            .load(&json!([{"__type": "note", "body": "hi"}]))
            .unwrap();

        assert_eq!(session.state(), LoadState::Loaded);
        assert!(session.document().is_some());
        assert!(session.load_error().is_none());
        assert!(session.needs_redraw());
    }

    #[test]
    fn test_load_failure_is_retained_not_swallowed() {
        let mut session = EditSession::new("client-1", registry());

        let err = session
            .load(&json!([{"__type": "mystery"}]))
            .unwrap_err();

        assert_eq!(session.state(), LoadState::Error);
        assert!(session.document().is_none());
        assert_eq!(session.load_error(), Some(&err));
    }

    #[test]
    fn test_no_data_is_terminal_presentation_state() {
        let mut session = EditSession::new("client-1", registry());
        session.mark_no_data();

        assert_eq!(session.state(), LoadState::NoData);
        assert!(session.document().is_none());
    }

    #[test]
    fn test_apply_without_document_is_not_loaded() {
        let mut session = EditSession::new("client-1", registry());

        let err = session
            .apply(Mutation::RemoveBlock {
                block_uid: "x".to_string(),
            })
            .unwrap_err();

        assert_eq!(err, EditorError::NotLoaded);
    }

    #[test]
    fn test_redraw_flag_is_idempotent_and_consumed() {
        let mut session = EditSession::new("client-1", registry());

        session.request_redraw();
        session.request_redraw();

        assert!(session.take_redraw());
        assert!(!session.take_redraw());
    }
}
