//! HTML seed content to a structured document.
//!
//! Block elements end with a `\n` run carrying the block format; inline
//! elements become text attributes. Elements whose class belongs to a
//! registered embed type are recovered through that type's `extract`, so
//! copied chip markup seeds back as markers.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use log::debug;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::editing::registry::EmbedRegistry;
use crate::models::document::{AttributeValue, Attributes, Document, EmbedRun};
use crate::models::embed::Chip;

/// Parse `html` into runs. Unknown elements contribute only their text.
pub fn document_from_html(html: &str, registry: &EmbedRegistry) -> Document {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let root = find_element(&dom.document, "body").unwrap_or_else(|| dom.document.clone());

    let mut reader = SeedReader::new(registry);
    reader.walk_children(&root, &Attributes::new());
    reader.doc
}

struct SeedReader<'r> {
    registry: &'r EmbedRegistry,
    doc: Document,
    /// Content pushed since the last line break
    line_open: bool,
    /// Line breaks pushed so far
    lines: usize,
    last_was_space: bool,
    /// Nesting depth of `<pre>`
    preformatted: usize,
}

impl<'r> SeedReader<'r> {
    fn new(registry: &'r EmbedRegistry) -> Self {
        Self {
            registry,
            doc: Document::new(),
            line_open: false,
            lines: 0,
            last_was_space: false,
            preformatted: 0,
        }
    }

    fn walk_children(&mut self, node: &Handle, inline: &Attributes) {
        for child in node.children.borrow().iter() {
            self.walk(child, inline);
        }
    }

    fn walk(&mut self, node: &Handle, inline: &Attributes) {
        match &node.data {
            NodeData::Text { contents } => self.push_text(&contents.borrow(), inline),
            NodeData::Element { name, attrs, .. } => {
                let attributes = attrs
                    .borrow()
                    .iter()
                    .map(|a| (a.name.local.to_string(), a.value.to_string()))
                    .collect();
                self.walk_element(node, &name.local, attributes, inline);
            }
            _ => {}
        }
    }

    fn walk_element(
        &mut self,
        node: &Handle,
        tag: &str,
        attributes: Vec<(String, String)>,
        inline: &Attributes,
    ) {
        match tag {
            "script" | "style" | "head" | "title" | "template" => {}
            "br" => {
                if self.line_open {
                    self.end_line(&Attributes::new());
                }
            }
            "p" | "div" | "li" | "blockquote" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5"
            | "h6" => self.walk_block(node, tag, inline),
            _ => {
                let chip = Chip {
                    element: tag.to_string(),
                    attributes,
                    label: text_content(node),
                };
                if let Some(embed) = self.extract_embed(&chip) {
                    self.doc.push(embed);
                    self.line_open = true;
                    self.last_was_space = false;
                    return;
                }

                let mut inline = inline.clone();
                if let Some((key, value)) = inline_format(tag, &chip, self.preformatted > 0) {
                    inline.insert(key.to_string(), value);
                }
                self.walk_children(node, &inline);
            }
        }
    }

    fn walk_block(&mut self, node: &Handle, tag: &str, inline: &Attributes) {
        if self.line_open {
            self.end_line(&Attributes::new());
        }
        let lines_before = self.lines;
        let block = block_format(tag);

        if tag == "pre" {
            self.preformatted += 1;
        }
        self.walk_children(node, inline);
        if tag == "pre" {
            self.preformatted -= 1;
        }

        // Empty blocks still occupy a line
        if self.line_open || self.lines == lines_before {
            self.end_line(&block);
        }
    }

    fn push_text(&mut self, text: &str, inline: &Attributes) {
        if self.preformatted > 0 {
            let block = block_format("pre");
            for (i, segment) in text.split('\n').enumerate() {
                if i > 0 {
                    self.end_line(&block);
                }
                if !segment.is_empty() {
                    self.doc.push_text(segment, inline.clone());
                    self.line_open = true;
                }
            }
            return;
        }

        let mut collapsed = collapse_whitespace(text);
        if !self.line_open || self.last_was_space {
            collapsed = collapsed.trim_start().to_string();
        }
        if collapsed.is_empty() {
            return;
        }
        self.last_was_space = collapsed.ends_with(' ');
        self.doc.push_text(&collapsed, inline.clone());
        self.line_open = true;
    }

    fn end_line(&mut self, block: &Attributes) {
        self.doc.push_text("\n", block.clone());
        self.line_open = false;
        self.last_was_space = false;
        self.lines += 1;
    }

    fn extract_embed(&self, chip: &Chip) -> Option<EmbedRun> {
        let classes = chip.attribute("class")?;
        let embed_type = classes
            .split_whitespace()
            .find_map(|class| self.registry.find_by_class(class))?;

        match embed_type.extract(chip) {
            Ok(payload) => Some(EmbedRun {
                type_tag: embed_type.descriptor().tag.to_string(),
                payload,
            }),
            Err(e) => {
                debug!("keeping <{}> as text: {e}", chip.element);
                None
            }
        }
    }
}

fn inline_format(tag: &str, chip: &Chip, preformatted: bool) -> Option<(&'static str, AttributeValue)> {
    let flag = AttributeValue::Flag(true);
    match tag {
        "strong" | "b" => Some(("bold", flag)),
        "em" | "i" => Some(("italic", flag)),
        "u" => Some(("underline", flag)),
        "s" | "strike" | "del" => Some(("strike", flag)),
        "code" if !preformatted => Some(("code", flag)),
        "a" => chip
            .attribute("href")
            .map(|href| ("link", AttributeValue::Text(href.to_string()))),
        _ => None,
    }
}

fn block_format(tag: &str) -> Attributes {
    let mut block = Attributes::new();
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse().unwrap_or(1);
            block.insert("header".to_string(), AttributeValue::Number(level));
        }
        "blockquote" => {
            block.insert("blockquote".to_string(), AttributeValue::Flag(true));
        }
        "pre" => {
            block.insert("code-block".to_string(), AttributeValue::Flag(true));
        }
        _ => {}
    }
    block
}

/// Runs of ASCII whitespace become one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

fn find_element(node: &Handle, tag: &str) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &node.data
        && &*name.local == tag
    {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{ContentRun, TextRun};
    use crate::models::marker::{MarkerPayload, TEMPLATE_MARKER_TAG, TemplateMarker};
    use crate::render::surface_html;
    use pretty_assertions::assert_eq;

    fn registry() -> EmbedRegistry {
        let mut registry = EmbedRegistry::new();
        registry.register(Box::new(TemplateMarker)).unwrap();
        registry
    }

    fn attrs(key: &str, value: AttributeValue) -> Attributes {
        Attributes::from([(key.to_string(), value)])
    }

    fn marker(text: &str, title: &str) -> ContentRun {
        EmbedRun {
            type_tag: TEMPLATE_MARKER_TAG.to_string(),
            payload: MarkerPayload::new(text, title),
        }
        .into()
    }

    #[test]
    fn test_bare_text_stays_inline() {
        let doc = document_from_html("Hello {{user}} ", &registry());
        assert_eq!(doc.runs(), &[TextRun::plain("Hello {{user}} ").into()]);
    }

    #[test]
    fn test_blocks_and_inline_formats() {
        let html = "<p>Hello <strong>{{user}}</strong></p><p><br></p><h2>Title</h2>";
        let doc = document_from_html(html, &registry());

        assert_eq!(
            doc.runs(),
            &[
                TextRun::plain("Hello ").into(),
                TextRun::styled("{{user}}", attrs("bold", AttributeValue::Flag(true))).into(),
                TextRun::plain("\n\n").into(),
                TextRun::plain("Title").into(),
                TextRun::styled("\n", attrs("header", AttributeValue::Number(2))).into(),
            ]
        );
    }

    #[test]
    fn test_whitespace_between_blocks_is_dropped() {
        let html = "<div>\n  <p>a   b</p>\n  <p>c</p>\n</div>";
        let doc = document_from_html(html, &registry());
        assert_eq!(doc.runs(), &[TextRun::plain("a b\nc\n").into()]);
    }

    #[test]
    fn test_links_and_line_breaks() {
        let html = r#"<p><a href="https://example.com">go</a><br>next</p>"#;
        let doc = document_from_html(html, &registry());

        assert_eq!(
            doc.runs(),
            &[
                TextRun::styled(
                    "go",
                    attrs("link", AttributeValue::Text("https://example.com".into()))
                )
                .into(),
                TextRun::plain("\nnext\n").into(),
            ]
        );
    }

    #[test]
    fn test_preformatted_lines() {
        let doc = document_from_html("<pre>one\ntwo</pre>", &registry());
        let code = attrs("code-block", AttributeValue::Flag(true));

        assert_eq!(
            doc.runs(),
            &[
                TextRun::plain("one").into(),
                TextRun::styled("\n", code.clone()).into(),
                TextRun::plain("two").into(),
                TextRun::styled("\n", code).into(),
            ]
        );
    }

    #[test]
    fn test_scripts_are_ignored() {
        let doc = document_from_html("<p>a<script>alert(1)</script></p>", &registry());
        assert_eq!(doc.flatten_text(), "a\n");
    }

    #[test]
    fn test_chip_markup_seeds_back_as_marker() {
        let registry = registry();
        let original = Document::from_runs(vec![
            TextRun::plain("Hi ").into(),
            marker("{{TestVariable1}}", "Test Variable 1"),
            TextRun::plain(" ").into(),
        ]);

        let html = surface_html(&original, &registry);
        let doc = document_from_html(&html, &registry);

        assert_eq!(
            doc.runs(),
            &[
                TextRun::plain("Hi ").into(),
                marker("{{TestVariable1}}", "Test Variable 1"),
                TextRun::plain(" \n").into(),
            ]
        );
    }

    #[test]
    fn test_chip_without_payload_falls_back_to_text() {
        let html = r#"<p><span class="dynamic-variable">loose</span></p>"#;
        let doc = document_from_html(html, &registry());
        assert_eq!(doc.runs(), &[TextRun::plain("loose\n").into()]);
    }
}
