//! Ruleset applicator.
//!
//! Compiles a validated [`RuleSet`] into rule objects once, then runs the
//! chain over the attributes of any number of documents:
//! - rules run in declaration order, each over every attribute it targets
//! - a failing rule leaves the attribute as it was before that rule
//! - the ruleset's [`FailurePolicy`] decides whether the document continues

use crate::config::schema::{FailurePolicy, RuleSet};
use crate::error::RuleError;
use crate::rules::{Rule, Services};
use crate::span::{Attribute, Document};
use std::fmt;

/// Outcome of one rule on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RuleOutcome should be checked for success/failure"]
pub enum RuleOutcome {
    Changed { before: String, after: String },
    Unchanged,
    /// The rule targets an attribute the document does not have.
    Skipped { reason: String },
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Changed { before, after } => write!(f, "{before:?} -> {after:?}"),
            RuleOutcome::Unchanged => write!(f, "unchanged"),
            RuleOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

#[derive(Debug)]
pub enum ApplicationError {
    /// A rule definition could not be turned into a rule.
    Build { rule_id: String, source: RuleError },
    /// A rule failed on one attribute.
    Rule {
        rule_id: String,
        attribute: String,
        source: RuleError,
    },
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::Build { rule_id, source } => {
                write!(f, "cannot build rule '{}': {}", rule_id, source)
            }
            ApplicationError::Rule {
                rule_id,
                attribute,
                source,
            } => write!(
                f,
                "rule '{}' failed on attribute '{}': {}",
                rule_id, attribute, source
            ),
        }
    }
}

impl std::error::Error for ApplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplicationError::Build { source, .. } | ApplicationError::Rule { source, .. } => {
                Some(source)
            }
        }
    }
}

/// One entry of an [`ApplyReport`].
#[derive(Debug)]
pub struct RuleApplication {
    pub rule_id: String,
    /// Attribute name; the targeted name for skipped rules
    pub attribute: String,
    pub result: Result<RuleOutcome, ApplicationError>,
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub entries: Vec<RuleApplication>,
    /// Set when the abort policy stopped the document early.
    pub aborted: bool,
}

impl ApplyReport {
    pub fn changed(&self) -> usize {
        self.count(|r| matches!(r, Ok(RuleOutcome::Changed { .. })))
    }

    pub fn failed(&self) -> usize {
        self.count(Result::is_err)
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, Ok(RuleOutcome::Skipped { .. })))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&Result<RuleOutcome, ApplicationError>) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.result)).count()
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub attribute: Option<String>,
    pub rule: Box<dyn Rule>,
}

impl CompiledRule {
    fn targets(&self, attribute: &Attribute) -> bool {
        self.attribute
            .as_deref()
            .map_or(true, |name| name == attribute.name)
    }
}

/// A ruleset ready to run.
#[derive(Debug, Clone)]
pub struct CompiledRuleSet {
    pub name: String,
    rules: Vec<CompiledRule>,
    policy: FailurePolicy,
    services: Services,
}

impl CompiledRuleSet {
    /// Build every rule of `set`. The ruleset's `file_prefix`, when given,
    /// overrides the one in `services`.
    pub fn compile(set: &RuleSet, services: Services) -> Result<Self, ApplicationError> {
        let rules = set
            .rules
            .iter()
            .map(|def| {
                let rule = def.rule.build().map_err(|source| ApplicationError::Build {
                    rule_id: def.id.clone(),
                    source,
                })?;
                Ok(CompiledRule {
                    id: def.id.clone(),
                    attribute: def.attribute.clone(),
                    rule,
                })
            })
            .collect::<Result<Vec<_>, ApplicationError>>()?;

        let services = match &set.meta.file_prefix {
            Some(prefix) => services.with_file_prefix(prefix.clone()),
            None => services,
        };

        Ok(Self {
            name: set.meta.name.clone(),
            rules,
            policy: set.meta.on_error,
            services,
        })
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Run the chain over `attributes`, mutating them in place.
    pub fn apply(&self, document: &Document, attributes: &mut [Attribute]) -> ApplyReport {
        let ctx = self.services.context(document);
        let mut report = ApplyReport::default();

        'rules: for compiled in &self.rules {
            if let Some(target) = &compiled.attribute {
                if !attributes.iter().any(|a| &a.name == target) {
                    report.entries.push(RuleApplication {
                        rule_id: compiled.id.clone(),
                        attribute: target.clone(),
                        result: Ok(RuleOutcome::Skipped {
                            reason: format!("no attribute named '{target}'"),
                        }),
                    });
                    continue;
                }
            }

            for attribute in attributes.iter_mut().filter(|a| compiled.targets(a)) {
                let before = attribute.clone();
                let result = match compiled.rule.apply(attribute, &ctx) {
                    Ok(()) if *attribute == before => Ok(RuleOutcome::Unchanged),
                    Ok(()) => {
                        tracing::debug!(
                            rule = %compiled.id,
                            attribute = %attribute.name,
                            "attribute changed"
                        );
                        Ok(RuleOutcome::Changed {
                            before: before.value.to_string(),
                            after: attribute.value.to_string(),
                        })
                    }
                    Err(source) => {
                        *attribute = before;
                        Err(ApplicationError::Rule {
                            rule_id: compiled.id.clone(),
                            attribute: attribute.name.clone(),
                            source,
                        })
                    }
                };

                let failed = result.is_err();
                if let Err(err) = &result {
                    tracing::warn!(policy = ?self.policy, "{err}");
                }
                report.entries.push(RuleApplication {
                    rule_id: compiled.id.clone(),
                    attribute: attribute.name.clone(),
                    result,
                });

                if failed && self.policy == FailurePolicy::Abort {
                    report.aborted = true;
                    break 'rules;
                }
            }
        }

        tracing::info!(
            ruleset = %self.name,
            document = %document.source_name,
            changed = report.changed(),
            skipped = report.skipped(),
            failed = report.failed(),
            aborted = report.aborted,
            "ruleset applied"
        );
        report
    }
}
