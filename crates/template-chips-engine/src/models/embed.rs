use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::error::Result;
use crate::models::marker::MarkerPayload;

/// Fixed shape an embed type registers under.
///
/// Two registrations are the same when their descriptors are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedDescriptor {
    /// Type tag stored in documents
    pub tag: &'static str,
    /// Element the chip renders as
    pub element: &'static str,
    /// CSS class identifying the chip in markup
    pub class: &'static str,
}

/// Extension contract the host document accepts for atomic inline objects.
pub trait EmbedType {
    fn descriptor(&self) -> EmbedDescriptor;

    /// Produce the non-editable visual unit for a payload.
    fn present(&self, payload: &MarkerPayload) -> Chip;

    /// Recover the payload from a previously presented unit.
    fn extract(&self, chip: &Chip) -> Result<MarkerPayload>;
}

/// A presented embed: one element with attributes and a visible label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub element: String,
    /// Attributes in insertion order
    pub attributes: Vec<(String, String)>,
    pub label: String,
}

impl Chip {
    pub fn new(element: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            attributes: Vec::new(),
            label: label.into(),
        }
    }

    /// Set an attribute, replacing an existing value of the same name.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<{}", self.element);
        for (name, value) in &self.attributes {
            html.push_str(&format!(
                " {name}=\"{}\"",
                encode_double_quoted_attribute(value)
            ));
        }
        html.push('>');
        html.push_str(&encode_text(&self.label));
        html.push_str(&format!("</{}>", self.element));
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_with_attribute_replaces() {
        let chip = Chip::new("span", "a")
            .with_attribute("class", "one")
            .with_attribute("class", "two three");

        assert_eq!(chip.attributes.len(), 1);
        assert!(chip.has_class("three"));
        assert!(!chip.has_class("one"));
    }

    #[test]
    fn test_to_html_escapes() {
        let chip = Chip::new("span", "<b> & co").with_attribute("data-title", "\"q\"");
        assert_eq!(
            chip.to_html(),
            r#"<span data-title="&quot;q&quot;">&lt;b&gt; &amp; co</span>"#
        );
    }
}
