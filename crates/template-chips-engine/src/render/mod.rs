//! # Rendering
//!
//! Two HTML views of one structured document:
//!
//! - **`projection`**: the published value, markers rendered as their literal
//!   `{{...}}` token text so the output is template source.
//! - **`surface_html`**: the live editing surface, markers presented as chips.
//!   This is what the copy override puts on the clipboard.
//!
//! Both share the line/inline rules of [`html::HtmlRenderer`].

pub mod html;
pub mod projection;

pub use html::{BlockMode, HtmlRenderer};
pub use projection::{project, surface_html};
