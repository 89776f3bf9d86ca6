use crate::pattern::{Occurrence, PatternSpec, RegexEngine, RegexError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Editable text addressed by 0-based character positions.
///
/// Range operations take inclusive `[start, end]` bounds and require
/// `start <= end < len()`. Requests outside that are no-ops (the mutating
/// methods return `false`) or yield an empty substring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextSpan {
    text: String,
}

impl TextSpan {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset of character `pos`; `pos == len()` maps to the end.
    fn byte_offset(&self, pos: usize) -> Option<usize> {
        self.text
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(self.text.len()))
            .nth(pos)
    }

    /// Byte range covering characters `[start, end]`.
    fn byte_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        if start > end {
            return None;
        }
        let from = self.byte_offset(start)?;
        let to = self.byte_offset(end + 1)?;
        Some(from..to)
    }

    /// Characters `[start, end]`, or `""` when the range is invalid.
    pub fn substring(&self, start: usize, end: usize) -> &str {
        match self.byte_range(start, end) {
            Some(range) => &self.text[range],
            None => "",
        }
    }

    /// Insert `s` before character `pos` (`pos == len()` appends).
    pub fn insert_at(&mut self, pos: usize, s: &str) -> bool {
        match self.byte_offset(pos) {
            Some(at) => {
                self.text.insert_str(at, s);
                true
            }
            None => false,
        }
    }

    /// Remove characters `[start, end]`.
    pub fn remove_range(&mut self, start: usize, end: usize) -> bool {
        match self.byte_range(start, end) {
            Some(range) => {
                self.text.replace_range(range, "");
                true
            }
            None => false,
        }
    }

    pub fn append(&mut self, s: &str) {
        self.text.push_str(s);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Keep only characters `[start, end]`; an invalid range clears the span.
    pub fn keep_range(&mut self, start: usize, end: usize) {
        let kept = self.substring(start, end).to_string();
        self.text = kept;
    }

    /// Splice `with` over a byte range reported by a [`crate::pattern::Match`].
    pub(crate) fn replace_bytes(&mut self, range: Range<usize>, with: &str) {
        self.text.replace_range(range, with);
    }

    /// Replace occurrences of `spec` with `replacement`. Returns true when
    /// the text changed.
    pub fn replace(
        &mut self,
        spec: &PatternSpec,
        replacement: &str,
        occurrence: Occurrence,
        engine: &dyn RegexEngine,
    ) -> Result<bool, RegexError> {
        let replaced = engine.replace(spec, &self.text, replacement, occurrence)?;
        if replaced == self.text {
            return Ok(false);
        }
        self.text = replaced;
        Ok(true)
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for TextSpan {
    fn from(value: &str) -> Self {
        TextSpan::new(value)
    }
}

impl From<String> for TextSpan {
    fn from(value: String) -> Self {
        TextSpan::new(value)
    }
}

/// A named, typed value extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub name: String,
    pub value: TextSpan,
    /// Type label; several tags are joined with `+`.
    #[serde(default, rename = "type")]
    pub type_label: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: TextSpan::new(value),
            type_label: String::new(),
        }
    }

    pub fn with_type(mut self, type_label: impl Into<String>) -> Self {
        self.type_label = type_label.into();
        self
    }
}

/// Document context handed to every rule call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path or name of the source document
    #[serde(default)]
    pub source_name: String,
    /// Full recognized text
    #[serde(default)]
    pub text: String,
    /// Document tags consumed by tag expansion and conditions
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Document {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }
}
