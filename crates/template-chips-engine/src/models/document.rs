use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::marker::MarkerPayload;

/// Zero-based offset into the flattened document.
///
/// Text contributes one position per `char`, every embed exactly one.
pub type Position = usize;

/// A style attribute value (`bold: true`, `link: "https://…"`, `header: 2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl AttributeValue {
    /// Whether the attribute switches its format on (`false` and `0` do not).
    pub fn is_set(&self) -> bool {
        match self {
            AttributeValue::Flag(flag) => *flag,
            AttributeValue::Number(n) => *n != 0,
            AttributeValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => s.parse().ok(),
            AttributeValue::Flag(_) => None,
        }
    }
}

/// Style attributes shared by every character of a text run.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A span of plain characters sharing one attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub attributes: Attributes,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn styled(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }

    /// Length in document positions (chars, not bytes)
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// An atomic, indivisible unit stored in place of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedRun {
    pub type_tag: String,
    pub payload: MarkerPayload,
}

/// One entry of a structured document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DeltaOp", into = "DeltaOp")]
pub enum ContentRun {
    Text(TextRun),
    Embed(EmbedRun),
}

impl ContentRun {
    /// Number of document positions this run occupies
    pub fn len(&self) -> usize {
        match self {
            ContentRun::Text(run) => run.len(),
            ContentRun::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            ContentRun::Text(run) => Some(run),
            ContentRun::Embed(_) => None,
        }
    }

    pub fn as_embed(&self) -> Option<&EmbedRun> {
        match self {
            ContentRun::Embed(run) => Some(run),
            ContentRun::Text(_) => None,
        }
    }
}

impl From<TextRun> for ContentRun {
    fn from(run: TextRun) -> Self {
        ContentRun::Text(run)
    }
}

impl From<EmbedRun> for ContentRun {
    fn from(run: EmbedRun) -> Self {
        ContentRun::Embed(run)
    }
}

/// Ordered sequence of content runs; order is left-to-right document order.
///
/// Serialises to the delta shape used by rich-text editors:
/// `{"ops":[{"insert":"Hi "},{"insert":{"TemplateMarker":{...}}}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "ops")]
    runs: Vec<ContentRun>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from runs exactly as given (no merging).
    pub fn from_runs(runs: Vec<ContentRun>) -> Self {
        Self { runs }
    }

    pub fn from_plain_text(text: &str) -> Self {
        let mut doc = Self::new();
        doc.push_text(text, Attributes::new());
        doc
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn runs(&self) -> &[ContentRun] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<ContentRun> {
        self.runs
    }

    /// Flattened length: chars of every text run plus one per embed
    pub fn len(&self) -> usize {
        self.runs.iter().map(ContentRun::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a run verbatim
    pub fn push(&mut self, run: impl Into<ContentRun>) {
        self.runs.push(run.into());
    }

    /// Append text, merging with the previous run when the attributes match.
    pub fn push_text(&mut self, text: &str, attributes: Attributes) {
        if text.is_empty() {
            return;
        }
        if let Some(ContentRun::Text(last)) = self.runs.last_mut()
            && last.attributes == attributes
        {
            last.text.push_str(text);
            return;
        }
        self.runs.push(ContentRun::Text(TextRun::styled(text, attributes)));
    }

    pub fn embeds(&self) -> impl Iterator<Item = &EmbedRun> {
        self.runs.iter().filter_map(ContentRun::as_embed)
    }

    /// Flatten to text, substituting each embed's marker string.
    pub fn flatten_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match run {
                ContentRun::Text(text) => out.push_str(&text.text),
                ContentRun::Embed(embed) => out.push_str(&embed.payload.marker),
            }
        }
        out
    }

    /// Drop empty text runs and merge neighbours with identical attributes.
    pub fn normalize(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        for run in runs {
            match run {
                ContentRun::Text(text) => self.push_text(&text.text, text.attributes),
                embed => self.runs.push(embed),
            }
        }
    }

    /// Insert a run at a flattened position, splitting a text run if needed.
    pub fn insert_run(&mut self, index: Position, run: ContentRun) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(EngineError::OutOfBounds { index, len });
        }

        let mut out = Vec::with_capacity(self.runs.len() + 2);
        let mut offset = 0;
        let mut pending = Some(run);

        for existing in std::mem::take(&mut self.runs) {
            let run_len = existing.len();
            if let Some(new_run) = pending.take() {
                if index == offset {
                    out.push(new_run);
                } else if index < offset + run_len {
                    // Only text runs span more than one position
                    if let ContentRun::Text(text) = &existing {
                        let (head, tail) = split_chars(&text.text, index - offset);
                        out.push(TextRun::styled(head, text.attributes.clone()).into());
                        out.push(new_run);
                        out.push(TextRun::styled(tail, text.attributes.clone()).into());
                        offset += run_len;
                        continue;
                    }
                    pending = Some(new_run);
                } else {
                    pending = Some(new_run);
                }
            }
            offset += run_len;
            out.push(existing);
        }
        if let Some(new_run) = pending {
            out.push(new_run);
        }

        self.runs = out;
        self.normalize();
        Ok(())
    }

    /// Remove `length` positions starting at `index`.
    pub fn delete_range(&mut self, index: Position, length: usize) -> Result<()> {
        let len = self.len();
        let end = index.saturating_add(length);
        if end > len {
            return Err(EngineError::OutOfBounds { index: end, len });
        }
        if length == 0 {
            return Ok(());
        }

        let mut offset = 0;
        let mut out = Vec::with_capacity(self.runs.len());
        for run in std::mem::take(&mut self.runs) {
            let run_len = run.len();
            let run_start = offset;
            let run_end = offset + run_len;
            offset = run_end;

            if run_end <= index || run_start >= end {
                out.push(run);
                continue;
            }
            if let ContentRun::Text(text) = run {
                let cut_start = index.max(run_start) - run_start;
                let cut_end = end.min(run_end) - run_start;
                let kept: String = text
                    .text
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| *i < cut_start || *i >= cut_end)
                    .map(|(_, c)| c)
                    .collect();
                out.push(TextRun::styled(kept, text.attributes).into());
            }
            // Overlapped embeds are dropped whole
        }

        self.runs = out;
        self.normalize();
        Ok(())
    }
}

/// Split a string after `at` chars.
pub(crate) fn split_chars(s: &str, at: usize) -> (&str, &str) {
    let byte = char_to_byte(s, at);
    s.split_at(byte)
}

/// Byte offset of the `at`-th char (clamped to the string length).
pub(crate) fn char_to_byte(s: &str, at: usize) -> usize {
    s.char_indices().nth(at).map_or(s.len(), |(byte, _)| byte)
}

/// Delta wire shape of a single run
#[derive(Serialize, Deserialize)]
struct DeltaOp {
    insert: DeltaInsert,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    attributes: Attributes,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DeltaInsert {
    Text(String),
    Embed(BTreeMap<String, MarkerPayload>),
}

impl TryFrom<DeltaOp> for ContentRun {
    type Error = String;

    fn try_from(op: DeltaOp) -> std::result::Result<Self, Self::Error> {
        match op.insert {
            DeltaInsert::Text(text) => Ok(TextRun::styled(text, op.attributes).into()),
            DeltaInsert::Embed(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "embed insert must have exactly one type tag, found {}",
                        map.len()
                    ));
                }
                let Some((type_tag, payload)) = map.into_iter().next() else {
                    return Err("empty embed insert".to_string());
                };
                Ok(EmbedRun { type_tag, payload }.into())
            }
        }
    }
}

impl From<ContentRun> for DeltaOp {
    fn from(run: ContentRun) -> Self {
        match run {
            ContentRun::Text(text) => DeltaOp {
                insert: DeltaInsert::Text(text.text),
                attributes: text.attributes,
            },
            ContentRun::Embed(embed) => DeltaOp {
                insert: DeltaInsert::Embed(BTreeMap::from([(embed.type_tag, embed.payload)])),
                attributes: Attributes::new(),
            },
        }
    }
}
