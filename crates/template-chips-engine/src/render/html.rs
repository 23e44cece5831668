use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::document::{Attributes, ContentRun, Document, EmbedRun};

/// Hook deciding how an embed renders; `None` renders nothing.
pub type CustomRender<'a> = dyn Fn(&EmbedRun) -> Option<String> + 'a;

/// How lines are wrapped in block elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockMode {
    /// Inline fragment when the document has no line break, blocks otherwise
    #[default]
    Auto,
    /// Every line is a block, even a single unterminated one
    Always,
}

/// Inline attributes in nesting order (outermost first) and their elements.
const INLINE_TAGS: [(&str, &str); 5] = [
    ("bold", "strong"),
    ("italic", "em"),
    ("underline", "u"),
    ("strike", "s"),
    ("code", "code"),
];

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Structured document to HTML.
///
/// Block formats live on the attributes of the `\n` that ends a line; inline
/// formats on the text itself.
pub struct HtmlRenderer<'a> {
    block_mode: BlockMode,
    custom: Option<Box<CustomRender<'a>>>,
}

impl Default for HtmlRenderer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> HtmlRenderer<'a> {
    pub fn new() -> Self {
        Self {
            block_mode: BlockMode::Auto,
            custom: None,
        }
    }

    pub fn block_mode(mut self, mode: BlockMode) -> Self {
        self.block_mode = mode;
        self
    }

    /// Override how embeds render.
    pub fn render_custom_with(
        mut self,
        render: impl Fn(&EmbedRun) -> Option<String> + 'a,
    ) -> Self {
        self.custom = Some(Box::new(render));
        self
    }

    pub fn render(&self, document: &Document) -> String {
        let (lines, trailing) = split_lines(document);
        let mut html = String::new();

        if lines.is_empty() && self.block_mode == BlockMode::Auto {
            self.render_inlines(&mut html, &trailing);
            return html;
        }

        for line in &lines {
            self.render_block(&mut html, &line.inlines, line.block);
        }
        if !trailing.is_empty() || lines.is_empty() {
            self.render_block(&mut html, &trailing, None);
        }
        html
    }

    fn render_block(&self, html: &mut String, inlines: &[Inline<'_>], block: Option<&Attributes>) {
        let tag = block_tag(block);
        html.push_str(&format!("<{tag}>"));
        if inlines.is_empty() {
            html.push_str("<br/>");
        } else {
            self.render_inlines(html, inlines);
        }
        html.push_str(&format!("</{tag}>"));
    }

    fn render_inlines(&self, html: &mut String, inlines: &[Inline<'_>]) {
        for inline in inlines {
            match inline {
                Inline::Text(text, attributes) => render_text(html, text, attributes),
                Inline::Embed(embed) => {
                    if let Some(rendered) = self.custom.as_ref().and_then(|render| render(*embed)) {
                        html.push_str(&rendered);
                    }
                }
            }
        }
    }
}

fn render_text(html: &mut String, text: &str, attributes: &Attributes) {
    let mut closers = Vec::new();

    if let Some(href) = attributes.get("link").and_then(|v| v.as_str()) {
        html.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\">",
            encode_double_quoted_attribute(href)
        ));
        closers.push("a");
    }
    for (attribute, tag) in INLINE_TAGS {
        if attributes.get(attribute).is_some_and(|v| v.is_set()) {
            html.push_str(&format!("<{tag}>"));
            closers.push(tag);
        }
    }

    html.push_str(&encode_text(text));

    for tag in closers.iter().rev() {
        html.push_str(&format!("</{tag}>"));
    }
}

fn block_tag(block: Option<&Attributes>) -> &'static str {
    let Some(attributes) = block else {
        return "p";
    };
    if let Some(level) = attributes.get("header").and_then(|v| v.as_number())
        && (1..=6).contains(&level)
    {
        return HEADINGS[(level - 1) as usize];
    }
    if attributes.get("blockquote").is_some_and(|v| v.is_set()) {
        return "blockquote";
    }
    if attributes.get("code-block").is_some_and(|v| v.is_set()) {
        return "pre";
    }
    "p"
}

enum Inline<'a> {
    Text(&'a str, &'a Attributes),
    Embed(&'a EmbedRun),
}

struct Line<'a> {
    inlines: Vec<Inline<'a>>,
    block: Option<&'a Attributes>,
}

/// Split runs into `\n`-terminated lines plus whatever trails the last break.
fn split_lines(document: &Document) -> (Vec<Line<'_>>, Vec<Inline<'_>>) {
    let mut lines = Vec::new();
    let mut current = Vec::new();

    for run in document.runs() {
        match run {
            ContentRun::Embed(embed) => current.push(Inline::Embed(embed)),
            ContentRun::Text(text) => {
                let mut segments = text.text.split('\n').peekable();
                while let Some(segment) = segments.next() {
                    if !segment.is_empty() {
                        current.push(Inline::Text(segment, &text.attributes));
                    }
                    if segments.peek().is_some() {
                        lines.push(Line {
                            inlines: std::mem::take(&mut current),
                            block: Some(&text.attributes),
                        });
                    }
                }
            }
        }
    }

    (lines, current)
}
