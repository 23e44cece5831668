//! Token grammar: `{{...}}` placeholders inside a single text run.
//!
//! Matching is leftmost-first and non-greedy on the inner content, so
//! `{{A}} {{B}}` is two tokens. `.` does not cross newlines and a token never
//! spans two runs; an unterminated `{{` is ordinary text.

use std::sync::OnceLock;

use regex::{CaptureMatches, Regex};

pub const OPEN: &str = "{{";
pub const CLOSE: &str = "}}";

const TOKEN_PATTERN: &str = r"\{\{(.*?)\}\}";

fn token_regex() -> &'static Regex {
    static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    TOKEN_REGEX.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("Invalid token regex"))
}

/// One token occurrence inside a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    /// Full matched text including delimiters
    pub text: &'a str,
    /// Raw capture between the delimiters, untrimmed
    pub inner: &'a str,
    /// Byte offset of the match in the scanned text
    pub byte_start: usize,
    /// Char offset of the match in the scanned text
    pub start: usize,
    /// Length of the match in chars
    pub len: usize,
}

impl TokenMatch<'_> {
    /// Char offset one past the end of the match
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn byte_end(&self) -> usize {
        self.byte_start + self.text.len()
    }

    /// Human label: inner text with surrounding whitespace trimmed
    pub fn title(&self) -> &str {
        self.inner.trim()
    }
}

/// Lazy iterator over the tokens of one text run.
pub struct Tokens<'a> {
    haystack: &'a str,
    captures: CaptureMatches<'static, 'a>,
    byte_cursor: usize,
    char_cursor: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = TokenMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        let whole = caps.get(0)?;
        let inner = caps.get(1).map_or("", |m| m.as_str());

        // Matches arrive in order, so char offsets are counted incrementally
        self.char_cursor += self.haystack[self.byte_cursor..whole.start()].chars().count();
        let start = self.char_cursor;
        let len = whole.as_str().chars().count();
        self.char_cursor += len;
        self.byte_cursor = whole.end();

        Some(TokenMatch {
            text: whole.as_str(),
            inner,
            byte_start: whole.start(),
            start,
            len,
        })
    }
}

/// Scan `text` for tokens.
pub fn find_tokens(text: &str) -> Tokens<'_> {
    Tokens {
        haystack: text,
        captures: token_regex().captures_iter(text),
        byte_cursor: 0,
        char_cursor: 0,
    }
}

/// Whether `text` is exactly one token and nothing else.
pub fn is_single_token(text: &str) -> bool {
    let mut tokens = find_tokens(text);
    matches!(
        (tokens.next(), tokens.next()),
        (Some(m), None) if m.byte_start == 0 && m.text.len() == text.len()
    )
}

/// Title derived from matched text: every brace removed, then trimmed.
pub fn title_from_marker(marker: &str) -> String {
    marker.replace(['{', '}'], "").trim().to_string()
}

/// Remove every whitespace character.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Wrap a label in delimiters: `Name` becomes `{{Name}}`.
pub fn marker_for(label: &str) -> String {
    format!("{OPEN}{label}{CLOSE}")
}
