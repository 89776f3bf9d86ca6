//! Left / right / middle substring extraction and removal.

use crate::error::RuleError;
use crate::persist::{ensure_u32, ByteReader, ByteWriter};
use crate::rules::{Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::{Attribute, TextSpan};
use serde::{Deserialize, Serialize};

const VERSION: u32 = 2;
const KIND: RuleKind = RuleKind::Limit;

/// Which part of the value a limit addresses. Mid positions are 1-based and
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitPart {
    Left(usize),
    Right(usize),
    Mid { start: usize, end: usize },
}

impl Default for LimitPart {
    fn default() -> Self {
        LimitPart::Left(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitMode {
    #[default]
    Extract,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    #[serde(default)]
    pub part: LimitPart,
    #[serde(default)]
    pub mode: LimitMode,
    /// Values shorter than the requested part are still processed.
    #[serde(default = "default_accept_shorter")]
    pub accept_shorter: bool,
}

fn default_accept_shorter() -> bool {
    true
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            part: LimitPart::default(),
            mode: LimitMode::default(),
            accept_shorter: default_accept_shorter(),
        }
    }
}

impl LimitConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        match self.part {
            LimitPart::Left(0) | LimitPart::Right(0) => {
                Err(RuleError::config(KIND, "character count must be positive"))
            }
            LimitPart::Mid { start: 0, .. } => {
                Err(RuleError::config(KIND, "start position is 1-based"))
            }
            LimitPart::Mid { start, end } if end < start => Err(RuleError::config(
                KIND,
                format!("end position {end} precedes start position {start}"),
            )),
            LimitPart::Left(n) | LimitPart::Right(n) => ensure_u32(KIND, "character count", n),
            LimitPart::Mid { start, end } => {
                ensure_u32(KIND, "start position", start)?;
                ensure_u32(KIND, "end position", end)
            }
        }
    }
}

/// Apply a limit to `value`.
pub fn limit(value: &mut TextSpan, config: &LimitConfig) {
    let len = value.len();
    let extract = config.mode == LimitMode::Extract;

    match config.part {
        LimitPart::Left(n) | LimitPart::Right(n) if n == 0 => {}
        LimitPart::Left(n) | LimitPart::Right(n) if len < n => {
            // Extract keeps a short value whole; remove takes all of it.
            match (extract, config.accept_shorter) {
                (true, false) | (false, true) => value.clear(),
                _ => {}
            }
        }
        LimitPart::Left(n) => {
            if extract {
                value.keep_range(0, n - 1);
            } else {
                value.remove_range(0, n - 1);
            }
        }
        LimitPart::Right(n) => {
            if extract {
                value.keep_range(len - n, len - 1);
            } else {
                value.remove_range(len - n, len - 1);
            }
        }
        LimitPart::Mid { start, end } => {
            if start == 0 || end < start || len == 0 {
                return;
            }
            let first = start - 1;
            let mut last = end - 1;
            if last >= len {
                if !config.accept_shorter {
                    if extract {
                        value.clear();
                    }
                    return;
                }
                last = len - 1;
            }
            if first > last {
                if extract {
                    value.clear();
                }
                return;
            }
            if extract {
                value.keep_range(first, last);
            } else {
                value.remove_range(first, last);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LimitRule {
    config: LimitConfig,
}

impl LimitRule {
    pub fn new(config: LimitConfig) -> Result<Self, RuleError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Replace the configuration; on error the previous one is kept.
    pub fn configure(&mut self, config: LimitConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &LimitConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        let version = reader.read_version(KIND, VERSION)?;
        let code = reader.read_u32()?;
        let a = reader.read_u32()? as usize;
        let b = reader.read_u32()? as usize;
        let part = match code {
            0 => LimitPart::Left(a),
            1 => LimitPart::Right(a),
            2 => LimitPart::Mid { start: a, end: b },
            other => {
                return Err(RuleError::malformed(format!("unknown limit part code {other}")))
            }
        };
        let mode = if reader.read_bool()? {
            LimitMode::Extract
        } else {
            LimitMode::Remove
        };
        // Version 1 always accepted shorter values.
        let accept_shorter = if version >= 2 {
            reader.read_bool()?
        } else {
            true
        };
        Ok(Self {
            config: LimitConfig {
                part,
                mode,
                accept_shorter,
            },
        })
    }
}

impl Rule for LimitRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        if let LimitPart::Mid { .. } = self.config.part {
            self.config.validate()?;
        }
        limit(&mut attribute.value, &self.config);
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::Limit(self.config)
    }

    fn save(&self, writer: &mut ByteWriter) {
        let (code, a, b) = match self.config.part {
            LimitPart::Left(n) => (0, n, 0),
            LimitPart::Right(n) => (1, n, 0),
            LimitPart::Mid { start, end } => (2, start, end),
        };
        writer.write_u32(VERSION);
        writer.write_u32(code);
        writer.write_u32(a as u32);
        writer.write_u32(b as u32);
        writer.write_bool(self.config.mode == LimitMode::Extract);
        writer.write_bool(self.config.accept_shorter);
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
