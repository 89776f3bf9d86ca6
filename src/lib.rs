//! Value Rules: configurable transformations for extracted text values
//!
//! A library of interchangeable rules that clean up values an upstream
//! recognition step pulled out of documents: occurrence-aware search and
//! replace, substring limits, padding and insertion, character-set edits,
//! fuzzy and exact translation, template reassembly, and conditional
//! composition.
//!
//! # Architecture
//!
//! Every rule implements [`Rule`]. Configuration is plain data
//! ([`RuleSpec`]) validated eagerly; application mutates an [`Attribute`] in
//! place given a [`RuleContext`] that carries the [`Document`] and the
//! injected [`Services`] (regex engine, list loader, tag expander). Rules
//! persist to a versioned little-endian binary form through [`serialize`] and
//! [`deserialize`].
//!
//! Rulesets chain rules from TOML (see [`config`]).
//!
//! # Example
//!
//! ```
//! use value_rules::{Attribute, Document, Rule, RuleSpec, Services};
//! use value_rules::rules::{LimitConfig, LimitMode, LimitPart};
//!
//! let rule = RuleSpec::Limit(LimitConfig {
//!     part: LimitPart::Left(3),
//!     mode: LimitMode::Remove,
//!     accept_shorter: true,
//! })
//! .build()
//! .unwrap();
//!
//! let services = Services::default();
//! let document = Document::new("scan-001.tif");
//! let mut attr = Attribute::new("InvoiceNumber", "NO.12345");
//! rule.apply(&mut attr, &services.context(&document)).unwrap();
//! assert_eq!(attr.value.as_str(), "12345");
//! ```

pub mod batch;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod persist;
pub mod rules;
pub mod span;

// Re-exports
pub use batch::{AttributeFile, BatchError};
pub use config::{
    load_from_path, load_from_str, ApplicationError, ApplyReport, CompiledRuleSet, ConfigError,
    RuleOutcome, RuleSet, VersionError,
};
pub use dynamic::{DynamicCache, FsListLoader, ListLoader, TagExpander};
pub use error::{BoxError, RuleError};
pub use pattern::{Occurrence, PatternReplacer, PatternSpec, RegexEngine, StdRegexEngine};
pub use rules::{deserialize, serialize, Rule, RuleContext, RuleKind, RuleSpec, Services};
pub use span::{Attribute, Document, TextSpan};
