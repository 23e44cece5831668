use log::trace;

use crate::editing::host::{EditorEvent, HostDocument, Selection, Source};
use crate::editing::registry::EmbedRegistry;
use crate::error::{EngineError, Result};
use crate::models::document::{ContentRun, Document, EmbedRun, Position, TextRun};
use crate::models::marker::MarkerPayload;
use crate::render::surface_html;

/// In-memory host document.
///
/// Holds the single live [`Document`], the selection and the embed registry.
/// Runs stay normalised after every mutation (no empty text runs, neighbours
/// with equal attributes merged) and the selection follows edits the way a
/// caret does. Non-silent mutations queue an [`EditorEvent`] that the owner
/// drains with [`HostDocument::take_events`].
#[derive(Debug, Default)]
pub struct EditorDocument {
    /// Live content, the single source of truth
    pub(crate) contents: Document,
    /// `None` while the surface is unfocused
    pub(crate) selection: Option<Selection>,
    /// Incremented on every content mutation, silent or not
    pub(crate) version: u64,
    registry: EmbedRegistry,
    events: Vec<EditorEvent>,
}

impl EditorDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: EmbedRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Borrow the live document without copying
    pub fn document(&self) -> &Document {
        &self.contents
    }

    /// Events queued and not yet drained
    pub fn pending_events(&self) -> &[EditorEvent] {
        &self.events
    }

    fn check_bounds(&self, index: Position) -> Result<()> {
        let len = self.contents.len();
        if index > len {
            return Err(EngineError::OutOfBounds { index, len });
        }
        Ok(())
    }

    fn check_registered(&self, type_tag: &str) -> Result<()> {
        if !self.registry.contains(type_tag) {
            return Err(EngineError::UnknownEmbed {
                tag: type_tag.to_string(),
            });
        }
        Ok(())
    }

    fn after_edit(&mut self, source: Source) {
        self.version += 1;
        if source.notifies() {
            self.events.push(EditorEvent::TextChange { source });
        }
    }

    fn shift_selection_for_insert(&mut self, index: Position, length: usize) {
        let shift = |pos: Position| if pos >= index { pos + length } else { pos };
        if let Some(selection) = self.selection {
            let start = shift(selection.index);
            let end = shift(selection.end());
            self.selection = Some(Selection::range(start, end - start));
        }
    }

    fn shift_selection_for_delete(&mut self, index: Position, length: usize) {
        let shift = |pos: Position| {
            if pos <= index {
                pos
            } else if pos >= index + length {
                pos - length
            } else {
                index
            }
        };
        if let Some(selection) = self.selection {
            let start = shift(selection.index);
            let end = shift(selection.end());
            self.selection = Some(Selection::range(start, end - start));
        }
    }
}

impl HostDocument for EditorDocument {
    fn contents(&self) -> Document {
        self.contents.clone()
    }

    fn set_contents(&mut self, mut document: Document, source: Source) -> Result<()> {
        for embed in document.embeds() {
            self.check_registered(&embed.type_tag)?;
        }
        document.normalize();
        trace!("set_contents: {} runs ({source:?})", document.runs().len());

        self.contents = document;
        let len = self.contents.len();
        if let Some(selection) = self.selection {
            let index = selection.index.min(len);
            let end = selection.end().min(len);
            self.selection = Some(Selection::range(index, end - index));
        }
        self.after_edit(source);
        Ok(())
    }

    fn len(&self) -> usize {
        self.contents.len()
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<Selection>, source: Source) {
        let len = self.contents.len();
        let selection = selection.map(|s| {
            let index = s.index.min(len);
            Selection::range(index, s.end().min(len) - index)
        });
        self.selection = selection;
        if source.notifies() {
            self.events
                .push(EditorEvent::SelectionChange { selection, source });
        }
    }

    fn delete_text(&mut self, index: Position, length: usize, source: Source) -> Result<()> {
        trace!("delete_text({index}, {length}, {source:?})");
        self.contents.delete_range(index, length)?;
        self.shift_selection_for_delete(index, length);
        self.after_edit(source);
        Ok(())
    }

    fn insert_text(&mut self, index: Position, text: &str, source: Source) -> Result<()> {
        trace!("insert_text({index}, {text:?}, {source:?})");
        self.check_bounds(index)?;
        if text.is_empty() {
            return Ok(());
        }
        let run = TextRun::plain(text);
        let length = run.len();
        self.contents.insert_run(index, ContentRun::Text(run))?;
        self.shift_selection_for_insert(index, length);
        self.after_edit(source);
        Ok(())
    }

    fn insert_embed(
        &mut self,
        index: Position,
        type_tag: &str,
        payload: MarkerPayload,
        source: Source,
    ) -> Result<()> {
        trace!("insert_embed({index}, {type_tag}, {:?}, {source:?})", payload.marker);
        self.check_registered(type_tag)?;
        self.check_bounds(index)?;
        let run = EmbedRun {
            type_tag: type_tag.to_string(),
            payload,
        };
        self.contents.insert_run(index, ContentRun::Embed(run))?;
        self.shift_selection_for_insert(index, 1);
        self.after_edit(source);
        Ok(())
    }

    fn registry(&self) -> &EmbedRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut EmbedRegistry {
        &mut self.registry
    }

    fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn root_html(&self) -> String {
        surface_html(&self.contents, &self.registry)
    }
}
