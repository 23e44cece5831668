use crate::editing::registry::EmbedRegistry;
use crate::models::document::Document;
use crate::models::marker::TEMPLATE_MARKER_TAG;
use crate::render::html::{BlockMode, HtmlRenderer};

/// Published HTML: markers are emitted as their exact token text.
pub fn project(document: &Document) -> String {
    HtmlRenderer::new()
        .render_custom_with(|embed| {
            (embed.type_tag == TEMPLATE_MARKER_TAG).then(|| embed.payload.marker.clone())
        })
        .render(document)
}

/// Surface markup: every line a block, embeds presented by their registered type.
pub fn surface_html(document: &Document, registry: &EmbedRegistry) -> String {
    HtmlRenderer::new()
        .block_mode(BlockMode::Always)
        .render_custom_with(|embed| {
            registry
                .get(&embed.type_tag)
                .map(|embed_type| embed_type.present(&embed.payload).to_html())
        })
        .render(document)
}
