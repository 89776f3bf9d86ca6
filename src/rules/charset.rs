//! Removal, trimming, and consolidation of a character set.

use crate::error::RuleError;
use crate::pattern::{Occurrence, PatternSpec, RegexEngine, RegexError};
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{ensure_configured, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::{Attribute, TextSpan};
use serde::{Deserialize, Serialize};

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::RemoveCharacters;

const CRLF: &str = "\r\n";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoveCharactersConfig {
    /// Characters to act on. A `\r\n` pair counts as one token.
    #[serde(default)]
    pub characters: String,
    /// Delete every occurrence; the other switches are ignored when set.
    #[serde(default)]
    pub remove_all: bool,
    #[serde(default)]
    pub consolidate: bool,
    #[serde(default)]
    pub trim_leading: bool,
    #[serde(default)]
    pub trim_trailing: bool,
}

impl RemoveCharactersConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.characters.is_empty() {
            return Err(RuleError::config(KIND, "character set is empty"));
        }
        if !(self.remove_all || self.consolidate || self.trim_leading || self.trim_trailing) {
            return Err(RuleError::config(KIND, "no operation selected"));
        }
        Ok(())
    }
}

/// The configured set split into its CR-LF token and single characters.
#[derive(Debug)]
struct CharacterSet {
    crlf: bool,
    singles: Vec<char>,
}

impl CharacterSet {
    fn parse(characters: &str) -> Self {
        let crlf = characters.contains(CRLF);
        let mut singles: Vec<char> = Vec::new();
        for c in characters.replace(CRLF, "").chars() {
            if !singles.contains(&c) {
                singles.push(c);
            }
        }
        Self { crlf, singles }
    }

    /// `[cs]+` over the whole set.
    fn run_pattern(&self) -> PatternSpec {
        let mut class = self.class_body();
        if self.crlf {
            class.push_str(r"\r\n");
        }
        PatternSpec::regex(format!("[{class}]+"), false)
    }

    /// `[cs]+` over the single characters only.
    fn singles_pattern(&self) -> Option<PatternSpec> {
        if self.singles.is_empty() {
            return None;
        }
        Some(PatternSpec::regex(format!("[{}]+", self.class_body()), false))
    }

    fn class_body(&self) -> String {
        self.singles
            .iter()
            .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
            .collect()
    }
}

fn remove_all(
    value: &mut TextSpan,
    pattern: &PatternSpec,
    engine: &dyn RegexEngine,
) -> Result<(), RegexError> {
    // Each pass deletes a non-empty run, so this terminates.
    while let Some(m) = engine.find(pattern, value.as_str(), true)?.into_iter().next() {
        value.replace_bytes(m.start..m.end, "");
    }
    Ok(())
}

fn consolidate(
    value: &mut TextSpan,
    set: &CharacterSet,
    engine: &dyn RegexEngine,
) -> Result<(), RegexError> {
    if set.crlf {
        let runs = PatternSpec::regex(r"(?:\r\n){2,}", false);
        value.replace(&runs, CRLF, Occurrence::All, engine)?;
    }
    if let Some(pattern) = set.singles_pattern() {
        let runs = engine.find(&pattern, value.as_str(), false)?;
        for m in runs.iter().rev() {
            let first: String = m.text.chars().take(1).collect();
            value.replace_bytes(m.start..m.end, &first);
        }
    }
    Ok(())
}

fn trim(
    value: &mut TextSpan,
    pattern: &PatternSpec,
    leading: bool,
    trailing: bool,
    engine: &dyn RegexEngine,
) -> Result<(), RegexError> {
    if leading {
        if let Some(m) = engine.find(pattern, value.as_str(), true)?.into_iter().next() {
            if m.start == 0 {
                value.replace_bytes(m.start..m.end, "");
            }
        }
    }
    if trailing {
        if let Some(m) = engine.find(pattern, value.as_str(), false)?.pop() {
            if m.end == value.as_str().len() {
                value.replace_bytes(m.start..m.end, "");
            }
        }
    }
    Ok(())
}

/// Run the configured edits over `value`.
pub fn edit_characters(
    value: &mut TextSpan,
    config: &RemoveCharactersConfig,
    engine: &dyn RegexEngine,
) -> Result<(), RegexError> {
    let set = CharacterSet::parse(&config.characters);
    let pattern = set.run_pattern();
    if config.remove_all {
        return remove_all(value, &pattern, engine);
    }
    if config.consolidate {
        consolidate(value, &set, engine)?;
    }
    trim(
        value,
        &pattern,
        config.trim_leading,
        config.trim_trailing,
        engine,
    )
}

#[derive(Debug, Clone, Default)]
pub struct RemoveCharactersRule {
    config: RemoveCharactersConfig,
}

impl RemoveCharactersRule {
    pub fn new(config: RemoveCharactersConfig) -> Result<Self, RuleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn configure(&mut self, config: RemoveCharactersConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &RemoveCharactersConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        Ok(Self {
            config: RemoveCharactersConfig {
                characters: reader.read_string()?,
                remove_all: reader.read_bool()?,
                consolidate: reader.read_bool()?,
                trim_leading: reader.read_bool()?,
                trim_trailing: reader.read_bool()?,
            },
        })
    }
}

impl Rule for RemoveCharactersRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        edit_characters(&mut attribute.value, &self.config, ctx.services.regex())
            .map_err(|err| RuleError::dependency(KIND, "edit characters", err))
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::RemoveCharacters(self.config.clone())
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_str(&self.config.characters);
        writer.write_bool(self.config.remove_all);
        writer.write_bool(self.config.consolidate);
        writer.write_bool(self.config.trim_leading);
        writer.write_bool(self.config.trim_trailing);
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
