//! Thread-local compiled regex cache.
//!
//! Rules re-run the same handful of patterns for every attribute of every
//! document, so compiled `Regex` values are kept per thread.
//! Cache is capped at 256 entries; it is cleared when full.

use crate::pattern::errors::RegexError;
use crate::pattern::PatternSpec;
use regex::{Regex, RegexBuilder};
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Key is "<i|c><l|r>:<pattern>" so the same text compiled literally,
    // as a regex, or case-insensitively never collides.
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

fn cache_key(spec: &PatternSpec) -> String {
    let case = if spec.ignore_case { 'i' } else { 'c' };
    let kind = if spec.literal { 'l' } else { 'r' };
    format!("{case}{kind}:{}", spec.pattern)
}

/// Get a compiled regex from cache, or compile and cache it.
pub fn get_or_compile(spec: &PatternSpec) -> Result<Regex, RegexError> {
    let key = cache_key(spec);

    REGEX_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(re) = cache.get(&key) {
            return Ok(re.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let source = if spec.literal {
            regex::escape(&spec.pattern)
        } else {
            spec.pattern.clone()
        };
        let compiled = RegexBuilder::new(&source)
            .case_insensitive(spec.ignore_case)
            .build()
            .map_err(|err| match err {
                regex::Error::CompiledTooBig(_) => RegexError::TooLarge {
                    pattern: spec.pattern.clone(),
                },
                other => RegexError::InvalidPattern {
                    pattern: spec.pattern.clone(),
                    message: other.to_string(),
                },
            })?;
        cache.insert(key, compiled.clone());
        Ok(compiled)
    })
}

/// Clear the cache (mainly for testing).
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of cached patterns on this thread.
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_distinguishes_flags() {
        clear_cache();
        get_or_compile(&PatternSpec::literal("a.b", false)).unwrap();
        get_or_compile(&PatternSpec::regex("a.b", false)).unwrap();
        get_or_compile(&PatternSpec::regex("a.b", true)).unwrap();
        get_or_compile(&PatternSpec::regex("a.b", true)).unwrap();
        assert_eq!(cache_size(), 3);
    }

    #[test]
    fn test_invalid_pattern_not_cached() {
        clear_cache();
        let err = get_or_compile(&PatternSpec::regex("(unclosed", false)).unwrap_err();
        assert!(matches!(err, RegexError::InvalidPattern { .. }));
        assert_eq!(cache_size(), 0);
    }
}
