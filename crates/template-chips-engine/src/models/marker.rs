use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::embed::{Chip, EmbedDescriptor, EmbedType};
use crate::parsing::grammar::{self, TokenMatch};

/// Type tag of the marker embed in documents and delta JSON.
pub const TEMPLATE_MARKER_TAG: &str = "TemplateMarker";

/// Identity of one recognised token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerPayload {
    /// Full token text including delimiters, e.g. `{{Test Variable 1}}`
    pub marker: String,
    /// Trimmed text between the delimiters
    pub title: String,
}

impl MarkerPayload {
    pub fn new(marker: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            title: title.into(),
        }
    }

    /// Payload for a grammar match, applying the whitespace policy for `origin`.
    ///
    /// Loaded tokens take the trimmed inner text as title; typed tokens drop
    /// every brace first, so `{{{a}}` is titled `{a` on load and `a` when typed.
    pub fn from_match(m: &TokenMatch<'_>, policy: WhitespacePolicy, origin: MarkerOrigin) -> Self {
        let marker = if policy.strips(origin) {
            grammar::strip_whitespace(m.text)
        } else {
            m.text.to_string()
        };
        let title = match origin {
            MarkerOrigin::Load => m.title().to_string(),
            MarkerOrigin::Typing => grammar::title_from_marker(m.text),
        };
        Self { marker, title }
    }
}

/// Where a marker conversion happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOrigin {
    /// Seeding a freshly mounted document
    Load,
    /// Reconciling text the user typed or inserted
    Typing,
}

/// Whether internal whitespace is removed from `marker` on conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhitespacePolicy {
    /// Keep whitespace when loading, strip it when typing
    #[default]
    StripOnTyping,
    StripAlways,
    KeepAlways,
}

impl WhitespacePolicy {
    pub fn strips(self, origin: MarkerOrigin) -> bool {
        match self {
            WhitespacePolicy::StripOnTyping => origin == MarkerOrigin::Typing,
            WhitespacePolicy::StripAlways => true,
            WhitespacePolicy::KeepAlways => false,
        }
    }
}

/// The non-editable chip standing in for a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateMarker;

impl TemplateMarker {
    pub const DESCRIPTOR: EmbedDescriptor = EmbedDescriptor {
        tag: TEMPLATE_MARKER_TAG,
        element: "span",
        class: "dynamic-variable",
    };

    pub const MARKER_ATTRIBUTE: &'static str = "data-marker";
    pub const TITLE_ATTRIBUTE: &'static str = "data-title";
}

impl EmbedType for TemplateMarker {
    fn descriptor(&self) -> EmbedDescriptor {
        Self::DESCRIPTOR
    }

    fn present(&self, payload: &MarkerPayload) -> Chip {
        Chip::new(Self::DESCRIPTOR.element, &payload.title)
            .with_attribute("class", Self::DESCRIPTOR.class)
            .with_attribute(Self::MARKER_ATTRIBUTE, &payload.marker)
            .with_attribute(Self::TITLE_ATTRIBUTE, &payload.title)
            .with_attribute("contenteditable", "false")
    }

    fn extract(&self, chip: &Chip) -> Result<MarkerPayload> {
        let marker = chip
            .attribute(Self::MARKER_ATTRIBUTE)
            .ok_or(EngineError::MissingAttribute {
                name: Self::MARKER_ATTRIBUTE,
            })?;
        let title = chip
            .attribute(Self::TITLE_ATTRIBUTE)
            .ok_or(EngineError::MissingAttribute {
                name: Self::TITLE_ATTRIBUTE,
            })?;
        Ok(MarkerPayload::new(marker, title))
    }
}
