use crate::pattern::engine::{PatternSpec, RegexEngine};
use crate::pattern::errors::RegexError;
use crate::pattern::occurrence::Occurrence;
use crate::span::TextSpan;

/// Occurrence-aware search/replace over a [`TextSpan`].
pub struct PatternReplacer<'a> {
    engine: &'a dyn RegexEngine,
}

impl<'a> PatternReplacer<'a> {
    pub fn new(engine: &'a dyn RegexEngine) -> Self {
        Self { engine }
    }

    /// Replace `find` in `text`. Returns true when the text changed.
    pub fn replace(
        &self,
        text: &mut TextSpan,
        find: &str,
        replacement: &str,
        case_sensitive: bool,
        occurrence: Occurrence,
        is_regex: bool,
    ) -> Result<bool, RegexError> {
        let spec = PatternSpec {
            pattern: find.to_string(),
            literal: !is_regex,
            ignore_case: !case_sensitive,
        };
        text.replace(&spec, replacement, occurrence, self.engine)
    }

    /// The text the first match of `pattern` would be replaced with, after
    /// back-references in `replacement` are expanded.
    ///
    /// Empty when `pattern` does not match `input`.
    pub fn expanded_replacement(
        &self,
        pattern: &str,
        input: &str,
        replacement: &str,
        case_sensitive: bool,
    ) -> Result<String, RegexError> {
        let spec = PatternSpec::regex(pattern, !case_sensitive);
        let Some(first) = self.engine.find(&spec, input, true)?.into_iter().next() else {
            return Ok(String::new());
        };

        let replaced = self
            .engine
            .replace(&spec, input, replacement, Occurrence::First)?;

        // Everything after the match is untouched, so it is also the tail of
        // the replaced text; what sits between is the expansion.
        let tail_len = input.len() - first.end;
        let expansion_end = replaced.len().saturating_sub(tail_len);
        Ok(replaced
            .get(first.start..expansion_end)
            .unwrap_or_default()
            .to_string())
    }
}
