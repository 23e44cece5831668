use log::{debug, trace};

use crate::editing::clipboard::{ClipboardPayload, copy_override};
use crate::editing::document::EditorDocument;
use crate::editing::host::{EditorEvent, HostDocument, Selection, Source};
use crate::editing::reconciler::{Reconciler, ReconcilerOptions, Reconciliation};
use crate::editing::registry::EmbedRegistry;
use crate::editing::transform::transform_with;
use crate::error::{EngineError, Result};
use crate::models::document::{Document, Position};
use crate::models::marker::TemplateMarker;
use crate::parsing::grammar::is_single_token;
use crate::parsing::html::document_from_html;
use crate::render::project;

/// Initial content handed to [`EditorSession::mount`].
#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    Html(String),
    PlainText(String),
    Delta(Document),
}

impl Seed {
    pub fn into_document(self, registry: &EmbedRegistry) -> Document {
        match self {
            Seed::Html(html) => document_from_html(&html, registry),
            Seed::PlainText(text) => Document::from_plain_text(&text),
            Seed::Delta(document) => document,
        }
    }
}

type Publisher = Box<dyn FnMut(&str)>;

/// One editing surface: host document, reconciler and projection publisher.
///
/// All input goes through the session so every committed edit is followed
/// by [`EditorSession::dispatch`], which delivers queued notifications to the
/// reconciler one at a time.
pub struct EditorSession<H: HostDocument = EditorDocument> {
    host: H,
    reconciler: Reconciler,
    publisher: Option<Publisher>,
    projection: String,
}

impl EditorSession<EditorDocument> {
    pub fn new(options: ReconcilerOptions) -> Result<Self> {
        Self::with_host(EditorDocument::new(), options)
    }
}

impl<H: HostDocument> EditorSession<H> {
    /// Wrap an existing host, registering the marker type on it.
    pub fn with_host(mut host: H, options: ReconcilerOptions) -> Result<Self> {
        host.registry_mut().register(Box::new(TemplateMarker))?;
        Ok(Self {
            host,
            reconciler: Reconciler::new(options),
            publisher: None,
            projection: String::new(),
        })
    }

    /// Receive every projection as it is published.
    pub fn on_publish(&mut self, publisher: impl FnMut(&str) + 'static) {
        self.publisher = Some(Box::new(publisher));
    }

    /// Seed the surface, convert tokens once and publish.
    pub fn mount(&mut self, seed: Seed) -> Result<()> {
        let document = seed.into_document(self.host.registry());
        let document = transform_with(&document, self.reconciler.options().whitespace);
        debug!(
            "mounting {} runs, {} marker(s)",
            document.runs().len(),
            document.embeds().count()
        );

        let closes_line = document.flatten_text().ends_with('\n');
        self.host.set_contents(document, Source::Silent)?;
        // Caret sits before the closing line break so typing extends the last line
        let end = self.host.len();
        let caret = if closes_line { end.saturating_sub(1) } else { end };
        self.host
            .set_selection(Some(Selection::caret(caret)), Source::Silent);
        self.publish(project(&self.host.contents()));
        Ok(())
    }

    /// User input at the caret, replacing a non-empty selection.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        let at = self.replace_selection()?;
        self.host.insert_text(at, text, Source::User)?;
        self.dispatch()?;
        Ok(())
    }

    pub fn delete_backward(&mut self) -> Result<()> {
        match self.host.selection() {
            Some(selection) if !selection.is_collapsed() => {
                self.host
                    .delete_text(selection.index, selection.length, Source::User)?;
            }
            Some(selection) if selection.index > 0 => {
                self.host.delete_text(selection.index - 1, 1, Source::User)?;
            }
            _ => return Ok(()),
        }
        self.dispatch()?;
        Ok(())
    }

    /// Move the caret by `delta` positions, collapsing any selection.
    pub fn move_caret(&mut self, delta: isize) {
        let len = self.host.len();
        let from = self.host.selection().map_or(len, |s| s.index);
        let to = from.saturating_add_signed(delta).min(len);
        self.host.set_selection(Some(Selection::caret(to)), Source::User);
    }

    pub fn select_all(&mut self) {
        let len = self.host.len();
        self.host
            .set_selection(Some(Selection::range(0, len)), Source::User);
    }

    /// Insert-token action: the token goes in as plain text and is converted
    /// by the reconciler like typed input.
    pub fn insert_token(&mut self, marker: &str) -> Result<()> {
        if !is_single_token(marker) {
            return Err(EngineError::MalformedToken {
                text: marker.to_string(),
            });
        }
        self.type_text(marker)
    }

    pub fn copy(&self) -> Option<ClipboardPayload> {
        copy_override(&self.host)
    }

    /// Deliver queued notifications in order.
    ///
    /// Each text change runs one reconciliation pass to completion before the
    /// next notification is looked at.
    pub fn dispatch(&mut self) -> Result<Vec<Reconciliation>> {
        let mut outcomes = Vec::new();
        loop {
            let events = self.host.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match event {
                    EditorEvent::TextChange { source } => {
                        trace!("text change ({source:?})");
                        if let Some(outcome) = self.reconciler.on_text_change(&mut self.host)? {
                            self.publish(outcome.html.clone());
                            outcomes.push(outcome);
                        }
                    }
                    EditorEvent::SelectionChange { selection, .. } => {
                        trace!("selection change {selection:?}");
                    }
                }
            }
        }
        Ok(outcomes)
    }

    /// Last published projection
    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    fn replace_selection(&mut self) -> Result<Position> {
        match self.host.selection() {
            Some(selection) if !selection.is_collapsed() => {
                self.host
                    .delete_text(selection.index, selection.length, Source::User)?;
                Ok(selection.index)
            }
            Some(selection) => Ok(selection.index),
            None => {
                let end = self.host.len();
                self.host
                    .set_selection(Some(Selection::caret(end)), Source::Silent);
                Ok(end)
            }
        }
    }

    fn publish(&mut self, html: String) {
        self.projection = html;
        if let Some(publisher) = self.publisher.as_mut() {
            publisher(&self.projection);
        }
    }
}
