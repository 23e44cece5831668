use crate::editing::registry::EmbedRegistry;
use crate::error::Result;
use crate::models::document::{Document, Position};
use crate::models::marker::MarkerPayload;

/// Who performed a mutation, and whether it notifies listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Input from the person at the keyboard
    User,
    /// Programmatic change that still notifies
    Api,
    /// Programmatic change that emits no notification
    Silent,
}

impl Source {
    pub fn notifies(self) -> bool {
        !matches!(self, Source::Silent)
    }
}

/// Caret or range selection in document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: Position,
    pub length: usize,
}

impl Selection {
    pub fn caret(index: Position) -> Self {
        Self { index, length: 0 }
    }

    pub fn range(index: Position, length: usize) -> Self {
        Self { index, length }
    }

    pub fn end(&self) -> Position {
        self.index + self.length
    }

    pub fn is_collapsed(&self) -> bool {
        self.length == 0
    }
}

/// Notification queued by a non-silent host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    TextChange { source: Source },
    SelectionChange {
        selection: Option<Selection>,
        source: Source,
    },
}

/// The editable structured-document surface the engine drives.
///
/// The host owns the live document, the selection and the embed registry.
/// Every mutation takes a [`Source`]; [`Source::Silent`] mutations must not
/// queue an [`EditorEvent`].
pub trait HostDocument {
    /// Copy of the live document
    fn contents(&self) -> Document;

    fn set_contents(&mut self, document: Document, source: Source) -> Result<()>;

    /// Flattened length of the live document
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current selection; `None` while the surface has no focus
    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Option<Selection>, source: Source);

    fn delete_text(&mut self, index: Position, length: usize, source: Source) -> Result<()>;

    fn insert_text(&mut self, index: Position, text: &str, source: Source) -> Result<()>;

    fn insert_embed(
        &mut self,
        index: Position,
        type_tag: &str,
        payload: MarkerPayload,
        source: Source,
    ) -> Result<()>;

    fn registry(&self) -> &EmbedRegistry;

    fn registry_mut(&mut self) -> &mut EmbedRegistry;

    /// Drain notifications queued since the last call
    fn take_events(&mut self) -> Vec<EditorEvent>;

    /// Live surface markup, embeds presented as chips
    fn root_html(&self) -> String;
}
