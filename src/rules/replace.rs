//! Ordered find/replace pairs with occurrence selection.

use crate::dynamic::DynamicCache;
use crate::error::RuleError;
use crate::pattern::{Occurrence, PatternReplacer};
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{ensure_configured, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 2;
const KIND: RuleKind = RuleKind::ReplaceStrings;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplaceStringsConfig {
    /// `(find, replace)` pairs, applied in order
    #[serde(default)]
    pub replacements: Vec<(String, String)>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub as_regex: bool,
    #[serde(default)]
    pub occurrence: Occurrence,
}

impl ReplaceStringsConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.replacements.is_empty() {
            return Err(RuleError::config(KIND, "at least one replacement is required"));
        }
        if let Some(idx) = self.replacements.iter().position(|(find, _)| find.is_empty()) {
            return Err(RuleError::config(
                KIND,
                format!("replacement {} has an empty find string", idx + 1),
            ));
        }
        self.occurrence
            .validate()
            .map_err(|err| RuleError::config(KIND, err.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplaceStringsRule {
    config: ReplaceStringsConfig,
    cache: DynamicCache,
}

impl ReplaceStringsRule {
    pub fn new(config: ReplaceStringsConfig) -> Result<Self, RuleError> {
        let mut rule = Self::default();
        rule.configure(config)?;
        Ok(rule)
    }

    /// Replace the configuration; on error the previous one is kept.
    pub fn configure(&mut self, config: ReplaceStringsConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        self.cache.invalidate();
        Ok(())
    }

    pub fn config(&self) -> &ReplaceStringsConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        let version = reader.read_version(KIND, VERSION)?;
        let count = reader.read_u32()? as usize;
        let mut replacements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let find = reader.read_string()?;
            let replace = reader.read_string()?;
            replacements.push((find, replace));
        }
        let case_sensitive = reader.read_bool()?;
        let as_regex = reader.read_bool()?;
        // Occurrence selection arrived in version 2; older data replaced all.
        let occurrence = if version >= 2 {
            Occurrence::from_index(reader.read_i32()?)
                .map_err(|err| RuleError::malformed(err.to_string()))?
        } else {
            Occurrence::All
        };
        Ok(Self {
            config: ReplaceStringsConfig {
                replacements,
                case_sensitive,
                as_regex,
                occurrence,
            },
            cache: DynamicCache::new(),
        })
    }
}

impl Rule for ReplaceStringsRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let pairs = self
            .cache
            .expand_pairs(&self.config.replacements, ctx, KIND)?;
        let replacer = PatternReplacer::new(ctx.services.regex());

        for (find, replace) in &pairs {
            if find.is_empty() {
                tracing::debug!(rule = %KIND, "skipping list entry with empty find string");
                continue;
            }
            let changed = replacer
                .replace(
                    &mut attribute.value,
                    find,
                    replace,
                    self.config.case_sensitive,
                    self.config.occurrence,
                    self.config.as_regex,
                )
                .map_err(|err| RuleError::dependency(KIND, "replace", err))?;
            if changed {
                tracing::trace!(find = %find, value = %attribute.value, "replaced");
            }
        }
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::ReplaceStrings(self.config.clone())
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_u32(self.config.replacements.len() as u32);
        for (find, replace) in &self.config.replacements {
            writer.write_str(find);
            writer.write_str(replace);
        }
        writer.write_bool(self.config.case_sensitive);
        writer.write_bool(self.config.as_regex);
        writer.write_i32(self.config.occurrence.to_index());
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
