use log::debug;

use crate::editing::host::HostDocument;

pub const HTML_MIME_TYPE: &str = "text/html";

/// What the copy gesture places on the clipboard instead of the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub mime_type: &'static str,
    pub html: String,
}

/// Copy override: the chip-rendered markup of the whole surface.
///
/// Returns `None` when there is no selection or it is collapsed, in which
/// case the platform default is left alone. The payload is always the full
/// root, never just the selected range, and chips stay chips rather than
/// turning back into token text.
pub fn copy_override<H: HostDocument + ?Sized>(host: &H) -> Option<ClipboardPayload> {
    let selection = host.selection()?;
    if selection.is_collapsed() {
        return None;
    }

    let html = host.root_html();
    debug!("copy override: {} bytes of {HTML_MIME_TYPE}", html.len());
    Some(ClipboardPayload {
        mime_type: HTML_MIME_TYPE,
        html,
    })
}
