pub mod document;
pub mod embed;
pub mod marker;

pub use document::{
    AttributeValue, Attributes, ContentRun, Document, EmbedRun, Position, TextRun,
};
pub use embed::{Chip, EmbedDescriptor, EmbedType};
pub use marker::{
    MarkerOrigin, MarkerPayload, TEMPLATE_MARKER_TAG, TemplateMarker, WhitespacePolicy,
};
