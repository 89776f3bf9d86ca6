//! Apply another rule only when a document condition holds.

use crate::error::RuleError;
use crate::pattern::PatternSpec;
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{ensure_configured, read_rule, write_rule, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::Conditional;

/// A predicate over the document an attribute came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Condition {
    TagEquals {
        tag: String,
        value: String,
    },
    TagPresent {
        tag: String,
    },
    /// Search the full document text.
    TextMatches {
        pattern: String,
        #[serde(default)]
        is_regex: bool,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl Condition {
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            Condition::TagEquals { tag, .. } | Condition::TagPresent { tag } if tag.is_empty() => {
                Err(RuleError::config(KIND, "condition tag name is empty"))
            }
            Condition::TextMatches { pattern, .. } if pattern.is_empty() => {
                Err(RuleError::config(KIND, "condition pattern is empty"))
            }
            _ => Ok(()),
        }
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<bool, RuleError> {
        let document = ctx.document;
        match self {
            Condition::TagEquals { tag, value } => Ok(document.tags.get(tag) == Some(value)),
            Condition::TagPresent { tag } => Ok(document.tags.contains_key(tag)),
            Condition::TextMatches {
                pattern,
                is_regex,
                case_sensitive,
            } => {
                let spec = PatternSpec {
                    pattern: pattern.clone(),
                    literal: !is_regex,
                    ignore_case: !case_sensitive,
                };
                let found = ctx
                    .services
                    .regex()
                    .find(&spec, &document.text, true)
                    .map_err(|err| RuleError::dependency(KIND, "evaluate condition", err))?;
                Ok(!found.is_empty())
            }
        }
    }

    fn save(&self, writer: &mut ByteWriter) {
        match self {
            Condition::TagEquals { tag, value } => {
                writer.write_u32(1);
                writer.write_str(tag);
                writer.write_str(value);
            }
            Condition::TagPresent { tag } => {
                writer.write_u32(2);
                writer.write_str(tag);
            }
            Condition::TextMatches {
                pattern,
                is_regex,
                case_sensitive,
            } => {
                writer.write_u32(3);
                writer.write_str(pattern);
                writer.write_bool(*is_regex);
                writer.write_bool(*case_sensitive);
            }
        }
    }

    fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        Ok(match reader.read_u32()? {
            1 => Condition::TagEquals {
                tag: reader.read_string()?,
                value: reader.read_string()?,
            },
            2 => Condition::TagPresent {
                tag: reader.read_string()?,
            },
            3 => Condition::TextMatches {
                pattern: reader.read_string()?,
                is_regex: reader.read_bool()?,
                case_sensitive: reader.read_bool()?,
            },
            other => {
                return Err(RuleError::malformed(format!(
                    "unknown condition code {other}"
                )))
            }
        })
    }
}

/// Plain-data form of a [`ConditionalRule`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionalSpec {
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub rule: Option<Box<RuleSpec>>,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionalRule {
    condition: Option<Condition>,
    inner: Option<Box<dyn Rule>>,
    invert: bool,
}

impl ConditionalRule {
    pub fn new(
        condition: Condition,
        inner: Box<dyn Rule>,
        invert: bool,
    ) -> Result<Self, RuleError> {
        let mut rule = Self::default();
        rule.configure(condition, inner, invert)?;
        Ok(rule)
    }

    /// Build from plain data; both the condition and the inner rule are required.
    pub fn from_spec(spec: &ConditionalSpec) -> Result<Self, RuleError> {
        let condition = spec
            .condition
            .clone()
            .ok_or_else(|| RuleError::config(KIND, "condition is missing"))?;
        let inner = spec
            .rule
            .as_deref()
            .ok_or_else(|| RuleError::config(KIND, "inner rule is missing"))?
            .build()?;
        Self::new(condition, inner, spec.invert)
    }

    pub fn configure(
        &mut self,
        condition: Condition,
        inner: Box<dyn Rule>,
        invert: bool,
    ) -> Result<(), RuleError> {
        condition.validate()?;
        self.condition = Some(condition);
        self.inner = Some(inner);
        self.invert = invert;
        Ok(())
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn inner(&self) -> Option<&dyn Rule> {
        self.inner.as_deref()
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        let condition = if reader.read_bool()? {
            Some(Condition::load(reader)?)
        } else {
            None
        };
        let invert = reader.read_bool()?;
        let inner = if reader.read_bool()? {
            Some(read_rule(reader)?)
        } else {
            None
        };
        Ok(Self {
            condition,
            inner,
            invert,
        })
    }
}

impl Rule for ConditionalRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        let condition_ok = self
            .condition
            .as_ref()
            .is_some_and(|c| c.validate().is_ok());
        condition_ok && self.inner.as_ref().is_some_and(|r| r.is_configured())
    }

    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let (Some(condition), Some(inner)) = (&self.condition, &self.inner) else {
            return Err(RuleError::Logic(
                "configured conditional without condition or rule".to_string(),
            ));
        };

        let holds = condition.evaluate(ctx)? != self.invert;
        tracing::debug!(rule = %KIND, inner = %inner.kind(), holds, "condition evaluated");
        if holds {
            inner.apply(attribute, ctx)?;
        }
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::Conditional(ConditionalSpec {
            condition: self.condition.clone(),
            invert: self.invert,
            rule: self.inner.as_ref().map(|r| Box::new(r.spec())),
        })
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_bool(self.condition.is_some());
        if let Some(condition) = &self.condition {
            condition.save(writer);
        }
        writer.write_bool(self.invert);
        writer.write_bool(self.inner.is_some());
        if let Some(inner) = &self.inner {
            write_rule(inner.as_ref(), writer);
        }
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
