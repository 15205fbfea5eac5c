use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::ParseError;

pub const SEVEN_TAG_ROSTER: [&str; 7] = ["Event", "Site", "Date", "Round", "White", "Black", "Result"];

static TAG_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[\s*([A-Za-z0-9_+#=:-]+)\s+"((?:[^"\\]|\\.)*)"\s*\]"#)
        .expect("valid tag pair regex")
});

/// Tag pairs in insertion order. Names are case-sensitive and unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Inserts or overwrites, keeping an existing tag's position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Inserts only when the tag is not yet present; a repeated tag keeps its
    /// first value.
    pub fn insert_first(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.0.contains_key(&name) {
            return false;
        }
        self.0.insert(name, value.into());
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert_first(k, v);
        }
        headers
    }
}

/// Reads `[Name "Value"]` pairs starting at `offset` until the first byte that
/// does not open a tag. Returns the tags and the offset where movetext begins.
pub fn parse_tag_section(text: &str, offset: usize) -> Result<(Headers, usize), ParseError> {
    let mut headers = Headers::new();
    let mut pos = offset;

    loop {
        pos = skip_whitespace(text, pos);
        if !text[pos..].starts_with('[') {
            return Ok((headers, pos));
        }

        let captures = TAG_PAIR
            .captures(&text[pos..])
            .ok_or(ParseError::MalformedTag { offset: pos })?;
        let (Some(whole), Some(name), Some(value)) = (captures.get(0), captures.get(1), captures.get(2))
        else {
            return Err(ParseError::MalformedTag { offset: pos });
        };

        headers.insert_first(name.as_str(), unescape(value.as_str()));
        pos += whole.end();
    }
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !c.is_whitespace())
        .map_or(text.len(), |i| from + i)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(next) = chars.next()
        {
            out.push(next);
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
