//! Split a value on a delimiter and reassemble it from a template.
//!
//! Templates reference 1-based tokens as `%N` or ranges as `%N-%M`. A range
//! is joined with the configured `text_between`. A backslash escapes `%`,
//! `-`, and itself; every other unescaped `%`, `-`, or `\` is rejected when
//! the rule is configured.
//!
//! ```text
//! input     "12,34,56,78"   delimiter ','
//! "%2-%4"        -> "345678"
//! "%4\-ABC\%4"   -> "78-ABC%4"
//! ```

use crate::error::RuleError;
use crate::pattern::{PatternSpec, RegexEngine, RegexError};
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{ensure_configured, LengthPredicate, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::Tokenizer;

const PLACEHOLDER: &str = r"(\\*)%(\d+)(-%(\d+))?";

/// A template that cannot be expanded. Positions are character offsets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("'%' at position {position} is not followed by a token number")]
    StrayPercent { position: usize },

    #[error("'-' at position {position} does not join two placeholders")]
    StrayDash { position: usize },

    #[error("'\\' at position {position} escapes nothing")]
    StrayBackslash { position: usize },

    #[error("token numbers start at 1 (position {position})")]
    ZeroIndex { position: usize },
}

/// Reads `%N` starting at `at` (which holds the `%`); returns the index after it.
fn placeholder_end(chars: &[char], at: usize) -> Result<usize, TemplateError> {
    let digits_start = at + 1;
    let mut end = digits_start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return Err(TemplateError::StrayPercent { position: at });
    }
    if chars[digits_start..end].iter().all(|&c| c == '0') {
        return Err(TemplateError::ZeroIndex { position: at });
    }
    Ok(end)
}

/// Check a template for stray metacharacters and zero token numbers.
pub fn validate_template(template: &str) -> Result<(), TemplateError> {
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let run_start = i;
                while i < chars.len() && chars[i] == '\\' {
                    i += 1;
                }
                if (i - run_start) % 2 == 1 {
                    // The last backslash of an odd run escapes the next char.
                    match chars.get(i) {
                        Some('%') | Some('-') => i += 1,
                        _ => return Err(TemplateError::StrayBackslash { position: i - 1 }),
                    }
                }
            }
            '%' => {
                i = placeholder_end(&chars, i)?;
                if chars.get(i) == Some(&'-') {
                    if chars.get(i + 1) != Some(&'%') {
                        return Err(TemplateError::StrayDash { position: i });
                    }
                    i = placeholder_end(&chars, i + 1)?;
                }
            }
            '-' => return Err(TemplateError::StrayDash { position: i }),
            _ => i += 1,
        }
    }
    Ok(())
}

/// Resolve `\\`, `\%`, and `\-` in one left-to-right pass.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek().filter(|n| matches!(n, '\\' | '%' | '-')) {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub template: String,
    /// Inserted between the tokens of a `%N-%M` range
    #[serde(default)]
    pub text_between: String,
    /// The value is left alone unless its token count satisfies this.
    #[serde(default)]
    pub token_count: LengthPredicate,
}

fn default_delimiter() -> char {
    ','
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            template: String::new(),
            text_between: String::new(),
            token_count: LengthPredicate::Any,
        }
    }
}

impl TokenizerConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.template.is_empty() {
            return Err(RuleError::config(KIND, "template is empty"));
        }
        validate_template(&self.template)
            .map_err(|err| RuleError::config(KIND, err.to_string()))?;
        self.token_count.validate(KIND)
    }
}

/// Expand `config.template` against the tokens of `input`.
///
/// Returns `None` when the token count gate rejects the input.
pub fn expand_template(
    input: &str,
    config: &TokenizerConfig,
    engine: &dyn RegexEngine,
) -> Result<Option<String>, RegexError> {
    let tokens: Vec<&str> = input.split(config.delimiter).collect();
    if !config.token_count.matches(tokens.len()) {
        return Ok(None);
    }

    let template = config.template.as_str();
    let spec = PatternSpec::regex(PLACEHOLDER, false);
    let placeholders = engine.find(&spec, template, false)?;

    let mut assembled = String::with_capacity(template.len() + input.len());
    let mut last = 0;
    for m in &placeholders {
        assembled.push_str(&template[last..m.start]);
        last = m.end;

        let backslashes = m.group(1).map_or(0, str::len);
        if backslashes % 2 == 1 {
            assembled.push_str(&m.text);
            continue;
        }
        assembled.push_str(&"\\".repeat(backslashes / 2));

        let Some(start) = m.group(2).and_then(|n| n.parse::<usize>().ok()) else {
            continue;
        };
        let end = match m.group(4) {
            Some(n) => match n.parse::<usize>() {
                Ok(end) => end,
                Err(_) => continue,
            },
            None => start,
        };
        let end = end.min(tokens.len());
        let selected: Vec<&str> = (start.max(1)..=end)
            .filter_map(|n| tokens.get(n - 1).copied())
            .collect();
        assembled.push_str(&selected.join(&config.text_between));
    }
    assembled.push_str(&template[last..]);

    Ok(Some(unescape(&assembled)))
}

#[derive(Debug, Clone, Default)]
pub struct TokenizerRule {
    config: TokenizerConfig,
}

impl TokenizerRule {
    pub fn new(config: TokenizerConfig) -> Result<Self, RuleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn configure(&mut self, config: TokenizerConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        Ok(Self {
            config: TokenizerConfig {
                delimiter: reader.read_char()?,
                template: reader.read_string()?,
                text_between: reader.read_string()?,
                token_count: LengthPredicate::load(reader)?,
            },
        })
    }
}

impl Rule for TokenizerRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let expanded = expand_template(attribute.value.as_str(), &self.config, ctx.services.regex())
            .map_err(|err| RuleError::dependency(KIND, "expand template", err))?;
        match expanded {
            Some(text) => attribute.value.set(text),
            None => tracing::debug!(
                rule = %KIND,
                gate = %self.config.token_count,
                "token count gate not met"
            ),
        }
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::Tokenizer(self.config.clone())
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_char(self.config.delimiter);
        writer.write_str(&self.config.template);
        writer.write_str(&self.config.text_between);
        self.config.token_count.save(writer);
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::StdRegexEngine;
    use crate::rules::{deserialize, serialize};

    fn expand(input: &str, template: &str, text_between: &str) -> Option<String> {
        let config = TokenizerConfig {
            template: template.to_string(),
            text_between: text_between.to_string(),
            ..Default::default()
        };
        config.validate().unwrap();
        expand_template(input, &config, &StdRegexEngine).unwrap()
    }

    #[test]
    fn test_range_and_escapes() {
        assert_eq!(expand("12,34,56,78", "%2-%4", "").as_deref(), Some("345678"));
        assert_eq!(
            expand("12,34,56,78", r"%4\-ABC\%4", "").as_deref(),
            Some("78-ABC%4")
        );
    }

    #[test]
    fn test_text_between_and_out_of_range() {
        assert_eq!(expand("a,b,c", "%2-%9", "/").as_deref(), Some("b/c"));
        assert_eq!(expand("a,b,c", "[%7]", "").as_deref(), Some("[]"));
        assert_eq!(expand("a,b,c", "%3-%1", "").as_deref(), Some(""));
    }

    #[test]
    fn test_huge_range_end_is_clamped() {
        assert_eq!(expand("a,b", "%1-%4000000000", "+").as_deref(), Some("a+b"));
        assert_eq!(expand("a,b", "%4000000000", "").as_deref(), Some(""));
    }

    #[test]
    fn test_even_backslashes_keep_placeholder_live() {
        assert_eq!(expand("a,b", r"\\%2", "").as_deref(), Some(r"\b"));
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(expand("a,b", r"fixed\-text", "").as_deref(), Some("fixed-text"));
    }

    #[test]
    fn test_count_gate() {
        let config = TokenizerConfig {
            template: "%1".to_string(),
            token_count: LengthPredicate::GreaterOrEqual(3),
            ..Default::default()
        };
        assert_eq!(expand_template("a,b", &config, &StdRegexEngine).unwrap(), None);
        assert_eq!(
            expand_template("a,b,c", &config, &StdRegexEngine).unwrap(),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("%1 and %2-%3").is_ok());
        assert!(validate_template(r"50\% off\-\\").is_ok());
        assert_eq!(
            validate_template("50% off"),
            Err(TemplateError::StrayPercent { position: 2 })
        );
        assert_eq!(
            validate_template("%1-2"),
            Err(TemplateError::StrayDash { position: 2 })
        );
        assert_eq!(
            validate_template("a-b"),
            Err(TemplateError::StrayDash { position: 1 })
        );
        assert_eq!(
            validate_template(r"\n"),
            Err(TemplateError::StrayBackslash { position: 0 })
        );
        assert_eq!(
            validate_template("%0"),
            Err(TemplateError::ZeroIndex { position: 0 })
        );
        assert_eq!(
            validate_template("%1-%00"),
            Err(TemplateError::ZeroIndex { position: 3 })
        );
    }

    #[test]
    fn test_invalid_template_keeps_previous_config() {
        let mut rule = TokenizerRule::new(TokenizerConfig {
            template: "%1".to_string(),
            ..Default::default()
        })
        .unwrap();
        let err = rule
            .configure(TokenizerConfig {
                template: "%".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(rule.config().template, "%1");
    }

    #[test]
    fn test_round_trip() {
        let rule = TokenizerRule::new(TokenizerConfig {
            delimiter: '|',
            template: "%3 %1-%2".to_string(),
            text_between: ", ".to_string(),
            token_count: LengthPredicate::Equal(3),
        })
        .unwrap();
        assert_eq!(deserialize(&serialize(&rule)).unwrap().spec(), rule.spec());

        let minimal = TokenizerRule::default();
        assert_eq!(
            deserialize(&serialize(&minimal)).unwrap().spec(),
            minimal.spec()
        );
    }
}
