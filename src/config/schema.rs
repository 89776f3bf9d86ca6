use crate::rules::RuleSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A named, ordered chain of rules loaded from TOML.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct RuleSet {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

impl RuleSet {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        if let Some(prefix) = &self.meta.file_prefix {
            if prefix.trim().is_empty() {
                issues.push(ValidationIssue::InvalidMeta {
                    message: "file_prefix cannot be empty".to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    rule_id: rule.id.clone(),
                });
            }

            if let Some(attribute) = &rule.attribute {
                if attribute.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        rule_id: Some(rule.id.clone()),
                        field: "attribute",
                    });
                }
            }

            if let Err(err) = rule.rule.build() {
                issues.push(ValidationIssue::InvalidRule {
                    rule_id: Some(rule.id.clone()),
                    message: err.to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Semver requirement on the library version
    #[serde(default)]
    pub requires: Option<String>,
    /// Overrides the prefix that marks file-backed list entries
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub on_error: FailurePolicy,
}

/// What the applicator does when a rule fails on an attribute.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure, keep the attribute as it was, and go on.
    #[default]
    Continue,
    /// Stop processing the document.
    Abort,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RuleDefinition {
    pub id: String,
    /// Restrict the rule to attributes with this name.
    #[serde(default)]
    pub attribute: Option<String>,
    pub rule: RuleSpec,
}

impl RuleDefinition {
    pub fn targets(&self, attribute_name: &str) -> bool {
        self.attribute
            .as_deref()
            .map_or(true, |name| name == attribute_name)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        rule_id: String,
    },
    InvalidRule {
        rule_id: Option<String>,
        message: String,
    },
    InvalidMeta {
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "ruleset contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { rule_id } => {
                write!(f, "rule id '{rule_id}' is used more than once")
            }
            ValidationIssue::InvalidRule { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid rule configuration: {message}"),
            },
            ValidationIssue::InvalidMeta { message } => write!(f, "invalid [meta]: {message}"),
        }
    }
}
