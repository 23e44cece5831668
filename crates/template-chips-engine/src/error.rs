use thiserror::Error;

/// Errors raised by the host document and the editor session.
///
/// Malformed token syntax is never one of these: text that does not match the
/// grammar is kept as literal characters.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No embed type registered under tag {tag:?}")]
    UnknownEmbed { tag: String },

    #[error("Embed tag {tag:?} is already registered with a different shape")]
    RegistryConflict { tag: String },

    #[error("Position {index} is outside the document (length {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("Expected exactly one {{{{...}}}} token, got {text:?}")]
    MalformedToken { text: String },

    #[error("Chip markup is missing the {name} attribute")]
    MissingAttribute { name: &'static str },

    #[error("Failed to read delta JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
