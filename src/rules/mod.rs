//! The rule library.
//!
//! Every rule implements [`Rule`]: it is configured once from plain data,
//! validated eagerly, and then applied to many attributes. Rules mutate the
//! attribute they are handed and nothing else; the only state a rule carries
//! across calls is the [`crate::dynamic::DynamicCache`] of expanded list files.

pub mod case;
pub mod charset;
pub mod closest;
pub mod conditional;
pub mod insert;
pub mod limit;
pub mod pad;
pub mod predicate;
pub mod replace;
pub mod spec;
pub mod tokenizer;
pub mod translate;

use crate::dynamic::{
    DocumentTagExpander, FsListLoader, ListLoader, TagExpander, DEFAULT_FILE_PREFIX,
};
use crate::error::RuleError;
use crate::pattern::{RegexEngine, StdRegexEngine};
use crate::persist::{ByteReader, ByteWriter};
use crate::span::{Attribute, Document};
use std::fmt;
use std::sync::Arc;

pub use case::{CaseType, ChangeCaseConfig, ChangeCaseRule};
pub use charset::{RemoveCharactersConfig, RemoveCharactersRule};
pub use closest::{
    find_closest, levenshtein_percent, ClosestMatch, ClosestValueConfig, ClosestValueRule,
    MATCH_THRESHOLD_PERCENT,
};
pub use conditional::{Condition, ConditionalRule, ConditionalSpec};
pub use insert::{InsertCharactersConfig, InsertCharactersRule, InsertPosition};
pub use limit::{LimitConfig, LimitMode, LimitPart, LimitRule};
pub use pad::{PadSide, PadValueConfig, PadValueRule};
pub use predicate::LengthPredicate;
pub use replace::{ReplaceStringsConfig, ReplaceStringsRule};
pub use spec::RuleSpec;
pub use tokenizer::{
    expand_template, validate_template, TemplateError, TokenizerConfig, TokenizerRule,
};
pub use translate::{TranslateField, TranslateValueConfig, TranslateValueRule};

/// Identifies a rule type. The numeric code is the persisted kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ReplaceStrings,
    Limit,
    RemoveCharacters,
    ClosestValue,
    TranslateValue,
    Tokenizer,
    Conditional,
    ChangeCase,
    PadValue,
    InsertCharacters,
}

impl RuleKind {
    pub const ALL: [RuleKind; 10] = [
        RuleKind::ReplaceStrings,
        RuleKind::Limit,
        RuleKind::RemoveCharacters,
        RuleKind::ClosestValue,
        RuleKind::TranslateValue,
        RuleKind::Tokenizer,
        RuleKind::Conditional,
        RuleKind::ChangeCase,
        RuleKind::PadValue,
        RuleKind::InsertCharacters,
    ];

    pub fn code(self) -> u32 {
        match self {
            RuleKind::ReplaceStrings => 1,
            RuleKind::Limit => 2,
            RuleKind::RemoveCharacters => 3,
            RuleKind::ClosestValue => 4,
            RuleKind::TranslateValue => 5,
            RuleKind::Tokenizer => 6,
            RuleKind::Conditional => 7,
            RuleKind::ChangeCase => 8,
            RuleKind::PadValue => 9,
            RuleKind::InsertCharacters => 10,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        RuleKind::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::ReplaceStrings => "replace-strings",
            RuleKind::Limit => "limit",
            RuleKind::RemoveCharacters => "remove-characters",
            RuleKind::ClosestValue => "closest-value",
            RuleKind::TranslateValue => "translate-value",
            RuleKind::Tokenizer => "tokenizer",
            RuleKind::Conditional => "conditional",
            RuleKind::ChangeCase => "change-case",
            RuleKind::PadValue => "pad-value",
            RuleKind::InsertCharacters => "insert-characters",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured value transformation.
pub trait Rule: fmt::Debug + Send + Sync {
    fn kind(&self) -> RuleKind;

    /// False until every required parameter has been supplied.
    fn is_configured(&self) -> bool;

    /// Transform `attribute` in place.
    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError>;

    /// Plain-data copy of the configuration.
    fn spec(&self) -> RuleSpec;

    /// Write the versioned body (without the kind tag).
    fn save(&self, writer: &mut ByteWriter);

    /// Deep copy of the configuration with a fresh cache.
    fn clone_box(&self) -> Box<dyn Rule>;
}

impl Clone for Box<dyn Rule> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub(crate) fn ensure_configured(rule: &dyn Rule) -> Result<(), RuleError> {
    if rule.is_configured() {
        Ok(())
    } else {
        Err(RuleError::config(rule.kind(), "rule is not configured"))
    }
}

/// Serialize a rule: kind tag, then the rule's versioned body.
pub fn serialize(rule: &dyn Rule) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    write_rule(rule, &mut writer);
    writer.into_bytes()
}

/// Inverse of [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<Box<dyn Rule>, RuleError> {
    let mut reader = ByteReader::new(bytes);
    let rule = read_rule(&mut reader)?;
    if !reader.is_at_end() {
        return Err(RuleError::malformed(format!(
            "trailing bytes after {} data",
            rule.kind()
        )));
    }
    Ok(rule)
}

pub(crate) fn write_rule(rule: &dyn Rule, writer: &mut ByteWriter) {
    writer.write_u32(rule.kind().code());
    rule.save(writer);
}

pub(crate) fn read_rule(reader: &mut ByteReader<'_>) -> Result<Box<dyn Rule>, RuleError> {
    reader.descend()?;
    let rule = read_rule_body(reader);
    reader.ascend();
    rule
}

fn read_rule_body(reader: &mut ByteReader<'_>) -> Result<Box<dyn Rule>, RuleError> {
    let code = reader.read_u32()?;
    let kind = RuleKind::from_code(code)
        .ok_or_else(|| RuleError::malformed(format!("unknown rule kind tag {code}")))?;
    let rule: Box<dyn Rule> = match kind {
        RuleKind::ReplaceStrings => Box::new(ReplaceStringsRule::load(reader)?),
        RuleKind::Limit => Box::new(LimitRule::load(reader)?),
        RuleKind::RemoveCharacters => Box::new(RemoveCharactersRule::load(reader)?),
        RuleKind::ClosestValue => Box::new(ClosestValueRule::load(reader)?),
        RuleKind::TranslateValue => Box::new(TranslateValueRule::load(reader)?),
        RuleKind::Tokenizer => Box::new(TokenizerRule::load(reader)?),
        RuleKind::Conditional => Box::new(ConditionalRule::load(reader)?),
        RuleKind::ChangeCase => Box::new(ChangeCaseRule::load(reader)?),
        RuleKind::PadValue => Box::new(PadValueRule::load(reader)?),
        RuleKind::InsertCharacters => Box::new(InsertCharactersRule::load(reader)?),
    };
    Ok(rule)
}

/// Collaborators injected by the host: regex engine, list loader, tag
/// expander, and the prefix that marks file-backed list entries.
#[derive(Clone)]
pub struct Services {
    regex: Arc<dyn RegexEngine>,
    lists: Arc<dyn ListLoader>,
    tags: Arc<dyn TagExpander>,
    file_prefix: String,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_regex_engine(mut self, regex: Arc<dyn RegexEngine>) -> Self {
        self.regex = regex;
        self
    }

    #[must_use]
    pub fn with_list_loader(mut self, lists: Arc<dyn ListLoader>) -> Self {
        self.lists = lists;
        self
    }

    #[must_use]
    pub fn with_tag_expander(mut self, tags: Arc<dyn TagExpander>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn regex(&self) -> &dyn RegexEngine {
        self.regex.as_ref()
    }

    pub fn lists(&self) -> &dyn ListLoader {
        self.lists.as_ref()
    }

    pub fn tags(&self) -> &dyn TagExpander {
        self.tags.as_ref()
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    pub fn context<'a>(&'a self, document: &'a Document) -> RuleContext<'a> {
        RuleContext {
            document,
            services: self,
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self {
            regex: Arc::new(StdRegexEngine),
            lists: Arc::new(FsListLoader::new()),
            tags: Arc::new(DocumentTagExpander),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("file_prefix", &self.file_prefix)
            .finish_non_exhaustive()
    }
}

/// Everything a rule sees besides the attribute it transforms.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub document: &'a Document,
    pub services: &'a Services,
}
