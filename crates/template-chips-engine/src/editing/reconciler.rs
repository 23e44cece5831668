//! Live-edit reconciliation.
//!
//! Runs after every committed edit: re-scans the live document for token
//! syntax, swaps each match for a marker embed plus a separator space using
//! silent mutations, places the caret and renders the projection.
//!
//! The reconciler is a two-state machine. A pass may only start from
//! [`ReconcileState::Idle`]; a notification arriving while a pass is in
//! progress is dropped, so the pass's own mutations can never re-enter it.

use std::cell::Cell;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::editing::host::{HostDocument, Selection, Source};
use crate::error::Result;
use crate::models::document::{ContentRun, Document, Position};
use crate::models::marker::{MarkerOrigin, MarkerPayload, TEMPLATE_MARKER_TAG, WhitespacePolicy};
use crate::parsing::grammar::find_tokens;
use crate::render::project;

/// Inserted after every converted marker
pub const SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Reconciling,
}

/// When the caret is pulled back from the end of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaretGuard {
    /// On every pass, whatever the document ends with
    Always,
    /// Only when the document ends with a marker and its separator
    TrailingMarker,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub caret_guard: CaretGuard,
    /// The caret may not pass `len - tail_reserve`
    pub tail_reserve: usize,
    pub whitespace: WhitespacePolicy,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            caret_guard: CaretGuard::Always,
            tail_reserve: 2,
            whitespace: WhitespacePolicy::StripOnTyping,
        }
    }
}

/// Outcome of one completed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Markers created in this pass, left to right
    pub converted: Vec<MarkerPayload>,
    /// Selection after caret placement and clamping
    pub selection: Option<Selection>,
    /// Projection of the reconciled document
    pub html: String,
}

/// Holds the reconciler in [`ReconcileState::Reconciling`]; dropping it
/// returns to [`ReconcileState::Idle`].
pub struct ReconcileGuard<'a> {
    state: &'a Cell<ReconcileState>,
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.state.set(ReconcileState::Idle);
    }
}

#[derive(Debug)]
pub struct Reconciler {
    state: Cell<ReconcileState>,
    options: ReconcilerOptions,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcilerOptions::default())
    }
}

impl Reconciler {
    pub fn new(options: ReconcilerOptions) -> Self {
        Self {
            state: Cell::new(ReconcileState::Idle),
            options,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state.get()
    }

    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    /// Enter `Reconciling`, or `None` if a pass is already running.
    pub fn begin(&self) -> Option<ReconcileGuard<'_>> {
        if self.state.get() == ReconcileState::Reconciling {
            return None;
        }
        self.state.set(ReconcileState::Reconciling);
        Some(ReconcileGuard { state: &self.state })
    }

    /// Handle one text-change notification.
    ///
    /// Returns `Ok(None)` when the notification was dropped by the
    /// re-entrancy guard.
    pub fn on_text_change<H: HostDocument + ?Sized>(
        &self,
        host: &mut H,
    ) -> Result<Option<Reconciliation>> {
        let Some(_guard) = self.begin() else {
            warn!("text change dropped: reconciliation already in progress");
            return Ok(None);
        };

        let snapshot = host.contents();
        let before = host.selection();

        let mut converted = Vec::new();
        let mut caret = None;
        let mut run_start = 0;
        // Net size change so far; offsets below are read from the snapshot
        let mut added = 0;
        let mut removed = 0;

        for run in snapshot.runs() {
            if let ContentRun::Text(text) = run {
                for m in find_tokens(&text.text) {
                    let live = run_start + m.start + added - removed;
                    let payload =
                        MarkerPayload::from_match(&m, self.options.whitespace, MarkerOrigin::Typing);

                    host.delete_text(live, m.len, Source::Silent)?;
                    host.insert_embed(live, TEMPLATE_MARKER_TAG, payload.clone(), Source::Silent)?;
                    host.insert_text(live + 1, SEPARATOR, Source::Silent)?;

                    added += 1 + SEPARATOR.chars().count();
                    removed += m.len;
                    caret = Some(live + 1 + SEPARATOR.chars().count());
                    converted.push(payload);
                }
            }
            run_start += run.len();
        }

        if let Some(index) = caret {
            host.set_selection(Some(Selection::caret(index)), Source::Silent);
        }
        self.clamp_caret(host);

        let selection = host.selection();
        if !converted.is_empty() || selection != before {
            debug!(
                "reconciled {} marker(s), selection {before:?} -> {selection:?}",
                converted.len()
            );
        }

        Ok(Some(Reconciliation {
            converted,
            selection,
            html: project(&host.contents()),
        }))
    }

    /// Keep the caret at or before `len - tail_reserve`.
    fn clamp_caret<H: HostDocument + ?Sized>(&self, host: &mut H) {
        let Some(selection) = host.selection() else {
            return;
        };
        let applies = match self.options.caret_guard {
            CaretGuard::Always => true,
            CaretGuard::TrailingMarker => ends_with_marker_pair(&host.contents()),
            CaretGuard::Off => false,
        };
        let len = host.len();
        if !applies || len < self.options.tail_reserve {
            return;
        }

        let limit: Position = len - self.options.tail_reserve;
        if selection.index > limit {
            host.set_selection(Some(Selection::caret(limit)), Source::Silent);
        }
    }
}

/// Whether the document ends with a marker followed only by its separator.
pub fn ends_with_marker_pair(document: &Document) -> bool {
    matches!(
        document.runs(),
        [.., ContentRun::Embed(embed), ContentRun::Text(tail)]
            if embed.type_tag == TEMPLATE_MARKER_TAG && tail.text == SEPARATOR
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::EditorDocument;
    use crate::editing::host::EditorEvent;
    use crate::editing::registry::EmbedRegistry;
    use crate::models::document::{AttributeValue, Attributes, EmbedRun, TextRun};
    use crate::models::marker::TemplateMarker;
    use pretty_assertions::assert_eq;

    fn host() -> EditorDocument {
        let mut registry = EmbedRegistry::new();
        registry.register(Box::new(TemplateMarker)).unwrap();
        EditorDocument::with_registry(registry)
    }

    fn options(caret_guard: CaretGuard) -> ReconcilerOptions {
        ReconcilerOptions {
            caret_guard,
            ..ReconcilerOptions::default()
        }
    }

    fn marker(text: &str, title: &str) -> ContentRun {
        EmbedRun {
            type_tag: TEMPLATE_MARKER_TAG.to_string(),
            payload: MarkerPayload::new(text, title),
        }
        .into()
    }

    /// Deliver queued text changes the way a session does
    fn drain(doc: &mut EditorDocument, reconciler: &Reconciler) -> Option<Reconciliation> {
        let mut last = None;
        for event in doc.take_events() {
            if let EditorEvent::TextChange { .. } = event {
                last = reconciler.on_text_change(doc).unwrap();
            }
        }
        last
    }

    /// Type at the end of the document, one char per edit
    fn type_at_end(doc: &mut EditorDocument, reconciler: &Reconciler, text: &str) {
        for ch in text.chars() {
            let end = doc.len();
            doc.insert_text(end, &ch.to_string(), Source::User).unwrap();
            drain(doc, reconciler);
        }
    }

    #[test]
    fn test_typing_a_token_converts_on_last_keystroke() {
        let mut doc = host();
        let reconciler = Reconciler::default();

        type_at_end(&mut doc, &reconciler, "{{Test Variable 1}");
        assert!(doc.document().embeds().next().is_none());

        type_at_end(&mut doc, &reconciler, "}");

        assert_eq!(
            doc.document().runs(),
            &[
                marker("{{TestVariable1}}", "Test Variable 1"),
                TextRun::plain(" ").into()
            ]
        );
        assert!(doc.take_events().is_empty());
    }

    #[test]
    fn test_pasted_text_with_two_tokens() {
        let mut doc = host();
        let reconciler = Reconciler::new(options(CaretGuard::Off));

        doc.insert_text(0, "a {{x}} b {{ y }}", Source::User).unwrap();
        let outcome = drain(&mut doc, &reconciler).unwrap();

        assert_eq!(
            doc.document().runs(),
            &[
                TextRun::plain("a ").into(),
                marker("{{x}}", "x"),
                TextRun::plain("  b ").into(),
                marker("{{y}}", "y"),
                TextRun::plain(" ").into(),
            ]
        );
        assert_eq!(outcome.converted.len(), 2);
        assert_eq!(outcome.selection, Some(Selection::caret(9)));
        assert_eq!(outcome.html, "a {{x}}  b {{y}} ");
    }

    #[test]
    fn test_pasted_text_with_multibyte_chars() {
        let mut doc = host();
        let reconciler = Reconciler::new(options(CaretGuard::Off));

        doc.insert_text(0, "h\u{e9}\u{e9} \u{1f389} {{a}} \u{fc} {{b c}}", Source::User)
            .unwrap();
        let outcome = drain(&mut doc, &reconciler).unwrap();

        assert_eq!(
            doc.document().runs(),
            &[
                TextRun::plain("h\u{e9}\u{e9} \u{1f389} ").into(),
                marker("{{a}}", "a"),
                TextRun::plain("  \u{fc} ").into(),
                marker("{{bc}}", "b c"),
                TextRun::plain(" ").into(),
            ]
        );
        assert_eq!(outcome.converted.len(), 2);
        assert_eq!(outcome.selection, Some(Selection::caret(13)));
    }

    #[test]
    fn test_tokens_in_later_runs_use_live_offsets() {
        let mut doc = host();
        let reconciler = Reconciler::new(options(CaretGuard::Off));
        let bold = Attributes::from([("bold".to_string(), AttributeValue::Flag(true))]);
        doc.set_contents(
            Document::from_runs(vec![
                TextRun::plain("{{first}} ").into(),
                TextRun::styled("x {{second}}", bold.clone()).into(),
            ]),
            Source::User,
        )
        .unwrap();

        drain(&mut doc, &reconciler);

        assert_eq!(
            doc.document().runs(),
            &[
                marker("{{first}}", "first"),
                TextRun::plain("  ").into(),
                TextRun::styled("x ", bold).into(),
                marker("{{second}}", "second"),
                TextRun::plain(" ").into(),
            ]
        );
    }

    #[test]
    fn test_token_split_by_formatting_stays_literal() {
        let mut doc = host();
        let reconciler = Reconciler::default();
        let bold = Attributes::from([("bold".to_string(), AttributeValue::Flag(true))]);
        let split = Document::from_runs(vec![
            TextRun::styled("{{Te", bold).into(),
            TextRun::plain("st}}").into(),
        ]);
        doc.set_contents(split.clone(), Source::User).unwrap();

        let outcome = drain(&mut doc, &reconciler).unwrap();

        assert!(outcome.converted.is_empty());
        assert_eq!(doc.document(), &split);
    }

    #[test]
    fn test_existing_markers_are_not_rescanned() {
        let mut doc = host();
        let reconciler = Reconciler::new(options(CaretGuard::Off));
        doc.set_contents(
            Document::from_runs(vec![marker("{{a}}", "a"), TextRun::plain(" tail").into()]),
            Source::User,
        )
        .unwrap();

        let outcome = drain(&mut doc, &reconciler).unwrap();

        assert!(outcome.converted.is_empty());
        assert_eq!(doc.document().embeds().count(), 1);
        assert_eq!(outcome.html, "{{a}} tail");
    }

    #[test]
    fn test_no_match_leaves_selection() {
        let mut doc = host();
        let reconciler = Reconciler::new(options(CaretGuard::Off));
        doc.insert_text(0, "plain text", Source::User).unwrap();
        doc.set_selection(Some(Selection::caret(3)), Source::Silent);

        let outcome = drain(&mut doc, &reconciler).unwrap();

        assert_eq!(outcome.selection, Some(Selection::caret(3)));
        assert_eq!(doc.version(), 1);
    }

    // ============ Caret guard ============

    #[test]
    fn test_always_guard_clamps_caret() {
        let mut doc = host();
        let reconciler = Reconciler::default();
        doc.set_selection(Some(Selection::caret(0)), Source::Silent);
        doc.insert_text(0, "abcdef", Source::User).unwrap();
        assert_eq!(doc.selection(), Some(Selection::caret(6)));

        drain(&mut doc, &reconciler);

        assert_eq!(doc.selection(), Some(Selection::caret(4)));
    }

    #[test]
    fn test_guard_ignores_short_documents() {
        let mut doc = host();
        let reconciler = Reconciler::default();
        doc.set_selection(Some(Selection::caret(0)), Source::Silent);
        doc.insert_text(0, "a", Source::User).unwrap();

        drain(&mut doc, &reconciler);

        assert_eq!(doc.selection(), Some(Selection::caret(1)));
    }

    #[test]
    fn test_trailing_marker_guard() {
        let mut doc = host();
        let reconciler = Reconciler::new(ReconcilerOptions {
            caret_guard: CaretGuard::TrailingMarker,
            tail_reserve: 1,
            ..ReconcilerOptions::default()
        });
        doc.set_selection(Some(Selection::caret(0)), Source::Silent);

        doc.insert_text(0, "abc", Source::User).unwrap();
        drain(&mut doc, &reconciler);
        assert_eq!(doc.selection(), Some(Selection::caret(3)));

        doc.insert_text(3, "{{n}}", Source::User).unwrap();
        drain(&mut doc, &reconciler);
        // Lands between the chip and its separator
        assert_eq!(doc.selection(), Some(Selection::caret(4)));
        assert!(ends_with_marker_pair(doc.document()));
    }

    #[test]
    fn test_unfocused_surface_has_no_caret_to_clamp() {
        let mut doc = host();
        let reconciler = Reconciler::default();
        doc.insert_text(0, "abcdef", Source::User).unwrap();

        let outcome = drain(&mut doc, &reconciler).unwrap();

        assert_eq!(outcome.selection, None);
    }

    // ============ Re-entrancy ============

    #[test]
    fn test_guard_blocks_nested_pass() {
        let mut doc = host();
        let reconciler = Reconciler::default();
        doc.insert_text(0, "{{x}}", Source::User).unwrap();

        let guard = reconciler.begin().unwrap();
        assert_eq!(reconciler.state(), ReconcileState::Reconciling);
        assert!(reconciler.begin().is_none());
        assert!(reconciler.on_text_change(&mut doc).unwrap().is_none());
        assert_eq!(doc.document().embeds().count(), 0);

        drop(guard);
        assert_eq!(reconciler.state(), ReconcileState::Idle);
        let outcome = reconciler.on_text_change(&mut doc).unwrap().unwrap();
        assert_eq!(outcome.converted.len(), 1);
        assert_eq!(reconciler.state(), ReconcileState::Idle);
    }

    #[test]
    fn test_ends_with_marker_pair() {
        assert!(ends_with_marker_pair(&Document::from_runs(vec![
            marker("{{a}}", "a"),
            TextRun::plain(" ").into()
        ])));
        assert!(!ends_with_marker_pair(&Document::from_runs(vec![
            marker("{{a}}", "a"),
            TextRun::plain(" x").into()
        ])));
        assert!(!ends_with_marker_pair(&Document::from_plain_text(" ")));
    }
}
