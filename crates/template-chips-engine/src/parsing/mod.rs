//! Text-level parsing: the token grammar and HTML seed content.

pub mod grammar;
pub mod html;

pub use grammar::{TokenMatch, find_tokens, is_single_token, marker_for};
pub use html::document_from_html;
