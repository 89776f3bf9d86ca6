use crate::error::RuleError;
use crate::rules::{
    ChangeCaseConfig, ChangeCaseRule, ClosestValueConfig, ClosestValueRule, ConditionalRule,
    ConditionalSpec, InsertCharactersConfig, InsertCharactersRule, LimitConfig, LimitRule,
    PadValueConfig, PadValueRule, RemoveCharactersConfig, RemoveCharactersRule,
    ReplaceStringsConfig, ReplaceStringsRule, Rule, RuleKind, TokenizerConfig, TokenizerRule,
    TranslateValueConfig, TranslateValueRule,
};
use serde::{Deserialize, Serialize};

/// Configuration of any rule, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleSpec {
    ReplaceStrings(ReplaceStringsConfig),
    Limit(LimitConfig),
    RemoveCharacters(RemoveCharactersConfig),
    ClosestValue(ClosestValueConfig),
    TranslateValue(TranslateValueConfig),
    Tokenizer(TokenizerConfig),
    Conditional(ConditionalSpec),
    ChangeCase(ChangeCaseConfig),
    PadValue(PadValueConfig),
    InsertCharacters(InsertCharactersConfig),
}

impl RuleSpec {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleSpec::ReplaceStrings(_) => RuleKind::ReplaceStrings,
            RuleSpec::Limit(_) => RuleKind::Limit,
            RuleSpec::RemoveCharacters(_) => RuleKind::RemoveCharacters,
            RuleSpec::ClosestValue(_) => RuleKind::ClosestValue,
            RuleSpec::TranslateValue(_) => RuleKind::TranslateValue,
            RuleSpec::Tokenizer(_) => RuleKind::Tokenizer,
            RuleSpec::Conditional(_) => RuleKind::Conditional,
            RuleSpec::ChangeCase(_) => RuleKind::ChangeCase,
            RuleSpec::PadValue(_) => RuleKind::PadValue,
            RuleSpec::InsertCharacters(_) => RuleKind::InsertCharacters,
        }
    }

    /// Validate the configuration and construct the rule.
    pub fn build(&self) -> Result<Box<dyn Rule>, RuleError> {
        Ok(match self {
            RuleSpec::ReplaceStrings(c) => Box::new(ReplaceStringsRule::new(c.clone())?),
            RuleSpec::Limit(c) => Box::new(LimitRule::new(*c)?),
            RuleSpec::RemoveCharacters(c) => Box::new(RemoveCharactersRule::new(c.clone())?),
            RuleSpec::ClosestValue(c) => Box::new(ClosestValueRule::new(c.clone())?),
            RuleSpec::TranslateValue(c) => Box::new(TranslateValueRule::new(c.clone())?),
            RuleSpec::Tokenizer(c) => Box::new(TokenizerRule::new(c.clone())?),
            RuleSpec::Conditional(c) => Box::new(ConditionalRule::from_spec(c)?),
            RuleSpec::ChangeCase(c) => Box::new(ChangeCaseRule::new(*c)),
            RuleSpec::PadValue(c) => Box::new(PadValueRule::new(*c)?),
            RuleSpec::InsertCharacters(c) => Box::new(InsertCharactersRule::new(c.clone())?),
        })
    }
}
