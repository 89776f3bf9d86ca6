//! Fuzzy translation against a candidate list.

use crate::dynamic::DynamicCache;
use crate::error::RuleError;
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{ensure_configured, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::ClosestValue;

/// Largest difference, in percent, that still counts as a match.
pub const MATCH_THRESHOLD_PERCENT: f64 = 70.0;

/// Edit distance scaled to 0..=100 by the longer string's character count.
pub fn levenshtein_percent(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    100.0 * strsim::levenshtein(a, b) as f64 / longest as f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestMatch {
    /// Index of the winning candidate
    pub index: usize,
    pub percent: f64,
    /// Candidates scored before the scan ended
    pub examined: usize,
}

/// Scan `candidates` for the one closest to `input`.
///
/// The first candidate with the lowest difference wins, and an exact match
/// ends the scan.
pub fn find_closest(
    input: &str,
    candidates: &[String],
    case_sensitive: bool,
) -> Option<ClosestMatch> {
    let fold = |s: &str| {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let input = fold(input);

    let mut best: Option<ClosestMatch> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let percent = levenshtein_percent(&input, &fold(candidate));
        let examined = index + 1;
        match best.as_mut() {
            Some(current) if percent >= current.percent => current.examined = examined,
            _ => {
                best = Some(ClosestMatch {
                    index,
                    percent,
                    examined,
                })
            }
        }
        if percent == 0.0 {
            break;
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosestValueConfig {
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Replace with the best candidate regardless of the threshold.
    #[serde(default)]
    pub force_match: bool,
}

impl ClosestValueConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.candidates.is_empty() {
            return Err(RuleError::config(KIND, "candidate list is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClosestValueRule {
    config: ClosestValueConfig,
    cache: DynamicCache,
}

impl ClosestValueRule {
    pub fn new(config: ClosestValueConfig) -> Result<Self, RuleError> {
        let mut rule = Self::default();
        rule.configure(config)?;
        Ok(rule)
    }

    pub fn configure(&mut self, config: ClosestValueConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        self.cache.invalidate();
        Ok(())
    }

    pub fn config(&self) -> &ClosestValueConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        Ok(Self {
            config: ClosestValueConfig {
                candidates: reader.read_strings()?,
                case_sensitive: reader.read_bool()?,
                force_match: reader.read_bool()?,
            },
            cache: DynamicCache::new(),
        })
    }
}

impl Rule for ClosestValueRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let candidates = self
            .cache
            .expand_values(&self.config.candidates, ctx, KIND)?;

        let Some(found) = find_closest(
            attribute.value.as_str(),
            &candidates,
            self.config.case_sensitive,
        ) else {
            tracing::debug!(rule = %KIND, "no candidates after list expansion");
            return Ok(());
        };

        if self.config.force_match || found.percent <= MATCH_THRESHOLD_PERCENT {
            tracing::trace!(
                candidate = %candidates[found.index],
                percent = found.percent,
                "closest value"
            );
            attribute.value.set(candidates[found.index].clone());
        } else {
            tracing::debug!(
                rule = %KIND,
                percent = found.percent,
                "best candidate is above the match threshold"
            );
        }
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::ClosestValue(self.config.clone())
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_strings(&self.config.candidates);
        writer.write_bool(self.config.case_sensitive);
        writer.write_bool(self.config.force_match);
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
