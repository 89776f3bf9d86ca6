//! Regex capability and occurrence-aware replacement.
//!
//! Rules see regular expressions only through [`RegexEngine`]; the default
//! [`StdRegexEngine`] wraps the `regex` crate with a thread-local cache.

pub mod cache;
pub mod engine;
pub mod errors;
pub mod occurrence;
pub mod replacer;

pub use engine::{Group, Match, PatternSpec, RegexEngine, StdRegexEngine};
pub use errors::RegexError;
pub use occurrence::{InvalidOccurrence, Occurrence, Selection};
pub use replacer::PatternReplacer;
