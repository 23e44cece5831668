pub mod editing;
pub mod error;
pub mod models;
pub mod parsing;
pub mod render;

// Re-export key types for easier usage
pub use editing::{
    CaretGuard, ClipboardPayload, EditorDocument, EditorEvent, EditorSession, EmbedRegistry,
    HostDocument, ReconcileState, Reconciler, ReconcilerOptions, Reconciliation, Seed, Selection,
    Source, transform, transform_with,
};
pub use error::{EngineError, Result};
pub use models::{
    AttributeValue, Attributes, Chip, ContentRun, Document, EmbedDescriptor, EmbedRun, EmbedType,
    MarkerPayload, Position, TEMPLATE_MARKER_TAG, TemplateMarker, TextRun, WhitespacePolicy,
};
pub use render::{BlockMode, HtmlRenderer, project, surface_html};
