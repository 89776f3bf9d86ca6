//! Exact-match translation of a value or its type label.

use crate::dynamic::{DynamicCache, DEFAULT_FILE_PREFIX};
use crate::error::RuleError;
use crate::pattern::{Occurrence, PatternReplacer};
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{ensure_configured, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::TranslateValue;

/// Separator between the tags of a type label.
const TYPE_SEPARATOR: char = '+';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslateField {
    #[default]
    Value,
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslateValueConfig {
    /// `(from, to)` pairs; the first matching key wins
    #[serde(default)]
    pub pairs: Vec<(String, String)>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub field: TranslateField,
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_type_target(to: &str) -> Result<(), RuleError> {
    if is_identifier(to) {
        Ok(())
    } else {
        Err(RuleError::config(
            KIND,
            format!("type translation target {to:?} is not an identifier"),
        ))
    }
}

impl TranslateValueConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.pairs.is_empty() {
            return Err(RuleError::config(KIND, "at least one pair is required"));
        }
        if self.field == TranslateField::Type {
            // List file pairs are checked as their lines are loaded.
            for (from, to) in &self.pairs {
                if !(to.is_empty() && from.starts_with(DEFAULT_FILE_PREFIX)) {
                    check_type_target(to)?;
                }
            }
        }
        Ok(())
    }

    fn keys_match(&self, key: &str, input: &str) -> bool {
        if self.case_sensitive {
            key == input
        } else {
            key.to_lowercase() == input.to_lowercase()
        }
    }

    fn lookup<'p>(
        &self,
        pairs: &'p [(String, String)],
        input: &str,
    ) -> Option<&'p (String, String)> {
        pairs.iter().find(|(from, _)| self.keys_match(from, input))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TranslateValueRule {
    config: TranslateValueConfig,
    cache: DynamicCache,
}

impl TranslateValueRule {
    pub fn new(config: TranslateValueConfig) -> Result<Self, RuleError> {
        let mut rule = Self::default();
        rule.configure(config)?;
        Ok(rule)
    }

    pub fn configure(&mut self, config: TranslateValueConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        self.cache.invalidate();
        Ok(())
    }

    pub fn config(&self) -> &TranslateValueConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        let count = reader.read_u32()? as usize;
        let mut pairs = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let from = reader.read_string()?;
            let to = reader.read_string()?;
            pairs.push((from, to));
        }
        let case_sensitive = reader.read_bool()?;
        let field = match reader.read_u32()? {
            0 => TranslateField::Value,
            1 => TranslateField::Type,
            other => {
                return Err(RuleError::malformed(format!(
                    "unknown translation field code {other}"
                )))
            }
        };
        Ok(Self {
            config: TranslateValueConfig {
                pairs,
                case_sensitive,
                field,
            },
            cache: DynamicCache::new(),
        })
    }

    fn translate_value(
        &self,
        attribute: &mut Attribute,
        pairs: &[(String, String)],
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let original = attribute.value.as_str().to_string();
        let Some((from, to)) = self.config.lookup(pairs, &original) else {
            return Ok(());
        };
        if from.is_empty() {
            attribute.value.set(to.clone());
            return Ok(());
        }
        PatternReplacer::new(ctx.services.regex())
            .replace(&mut attribute.value, &original, to, true, Occurrence::All, false)
            .map_err(|err| RuleError::dependency(KIND, "replace", err))?;
        Ok(())
    }

    fn translate_type(
        &self,
        attribute: &mut Attribute,
        pairs: &[(String, String)],
    ) -> Result<(), RuleError> {
        let mut tokens = Vec::new();
        for token in attribute.type_label.split(TYPE_SEPARATOR) {
            match self.config.lookup(pairs, token) {
                Some((_, to)) => {
                    check_type_target(to)?;
                    tokens.push(to.as_str());
                }
                None => tokens.push(token),
            }
        }
        let label = tokens.join("+");
        attribute.type_label = label;
        Ok(())
    }
}

impl Rule for TranslateValueRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let pairs = self.cache.expand_pairs(&self.config.pairs, ctx, KIND)?;
        match self.config.field {
            TranslateField::Value => self.translate_value(attribute, &pairs, ctx),
            TranslateField::Type => self.translate_type(attribute, &pairs),
        }
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::TranslateValue(self.config.clone())
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_u32(self.config.pairs.len() as u32);
        for (from, to) in &self.config.pairs {
            writer.write_str(from);
            writer.write_str(to);
        }
        writer.write_bool(self.config.case_sensitive);
        writer.write_u32(match self.config.field {
            TranslateField::Value => 0,
            TranslateField::Type => 1,
        });
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{deserialize, serialize, Services};
    use crate::span::Document;
    use std::fs;

    fn pair(from: &str, to: &str) -> (String, String) {
        (from.to_string(), to.to_string())
    }

    fn apply(rule: &TranslateValueRule, attr: &mut Attribute) -> Result<(), RuleError> {
        let services = Services::default();
        let doc = Document::default();
        rule.apply(attr, &services.context(&doc))
    }

    #[test]
    fn test_value_first_match_wins() {
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("ny", "New York"), pair("NY", "Nope")],
            ..Default::default()
        })
        .unwrap();
        let mut attr = Attribute::new("State", "NY");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.value.as_str(), "New York");
    }

    #[test]
    fn test_value_case_sensitive_miss() {
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("ny", "New York")],
            case_sensitive: true,
            ..Default::default()
        })
        .unwrap();
        let mut attr = Attribute::new("State", "NY");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.value.as_str(), "NY");
    }

    #[test]
    fn test_empty_key_sets_empty_value() {
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("", "N/A")],
            ..Default::default()
        })
        .unwrap();
        let mut attr = Attribute::new("State", "");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.value.as_str(), "N/A");

        let mut attr = Attribute::new("State", "CA");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.value.as_str(), "CA");
    }

    #[test]
    fn test_type_tokens_translate_independently() {
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("amt", "Amount"), pair("tot", "Total")],
            field: TranslateField::Type,
            ..Default::default()
        })
        .unwrap();
        let mut attr = Attribute::new("x", "5").with_type("AMT+Final+tot");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.type_label, "Amount+Final+Total");
        assert_eq!(attr.value.as_str(), "5");
    }

    #[test]
    fn test_empty_type_label_is_one_token() {
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("", "Unknown")],
            field: TranslateField::Type,
            ..Default::default()
        })
        .unwrap();
        let mut attr = Attribute::new("x", "5");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.type_label, "Unknown");
    }

    #[test]
    fn test_type_target_must_be_identifier() {
        let err = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("a", "not valid")],
            field: TranslateField::Type,
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_literal_type_target_rejected() {
        let err = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("amt", "")],
            field: TranslateField::Type,
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_configuration());

        // The same pair is fine for values: it clears a matching value.
        assert!(TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("amt", "")],
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_file_pairs_checked_on_apply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("types.txt");
        fs::write(&path, "// types\namt;Amount\nqty;bad target\n").unwrap();
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair(&format!("file://{}", path.display()), "")],
            field: TranslateField::Type,
            ..Default::default()
        })
        .unwrap();

        let mut attr = Attribute::new("x", "1").with_type("amt");
        apply(&rule, &mut attr).unwrap();
        assert_eq!(attr.type_label, "Amount");

        let mut attr = Attribute::new("x", "1").with_type("qty");
        assert!(apply(&rule, &mut attr).unwrap_err().is_configuration());
    }

    #[test]
    fn test_round_trip() {
        let rule = TranslateValueRule::new(TranslateValueConfig {
            pairs: vec![pair("a", "A"), pair("file://map.txt", "")],
            case_sensitive: true,
            field: TranslateField::Type,
        })
        .unwrap();
        assert_eq!(deserialize(&serialize(&rule)).unwrap().spec(), rule.spec());

        let minimal = TranslateValueRule::default();
        assert_eq!(
            deserialize(&serialize(&minimal)).unwrap().spec(),
            minimal.spec()
        );
    }
}
