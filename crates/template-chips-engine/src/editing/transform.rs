//! Marker transformation: text runs in, text and marker runs out.

use crate::models::document::{ContentRun, Document, EmbedRun, TextRun};
use crate::models::marker::{MarkerOrigin, MarkerPayload, TEMPLATE_MARKER_TAG, WhitespacePolicy};
use crate::parsing::grammar::find_tokens;

/// Replace every token in every text run with a marker embed.
///
/// Uses the load-path whitespace rule of the default policy, which keeps
/// `marker` exactly as matched.
pub fn transform(document: &Document) -> Document {
    transform_with(document, WhitespacePolicy::default())
}

/// [`transform`] with an explicit whitespace policy.
///
/// Pure: returns a new document and never looks at the selection. Existing
/// embeds pass through untouched and text around a token keeps its run's
/// attributes.
pub fn transform_with(document: &Document, policy: WhitespacePolicy) -> Document {
    let mut runs = Vec::with_capacity(document.runs().len());
    for run in document.runs() {
        match run {
            ContentRun::Text(text) => match split_run(text, policy) {
                Some(pieces) => runs.extend(pieces),
                None => runs.push(run.clone()),
            },
            ContentRun::Embed(_) => runs.push(run.clone()),
        }
    }
    Document::from_runs(runs)
}

/// Split one text run around its tokens; `None` when it has none.
pub fn split_run(run: &TextRun, policy: WhitespacePolicy) -> Option<Vec<ContentRun>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for m in find_tokens(&run.text) {
        if last < m.byte_start {
            pieces.push(
                TextRun::styled(&run.text[last..m.byte_start], run.attributes.clone()).into(),
            );
        }
        pieces.push(
            EmbedRun {
                type_tag: TEMPLATE_MARKER_TAG.to_string(),
                payload: MarkerPayload::from_match(&m, policy, MarkerOrigin::Load),
            }
            .into(),
        );
        last = m.byte_end();
    }

    if pieces.is_empty() {
        return None;
    }
    if last < run.text.len() {
        pieces.push(TextRun::styled(&run.text[last..], run.attributes.clone()).into());
    }
    Some(pieces)
}
