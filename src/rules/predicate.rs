use crate::error::RuleError;
use crate::persist::{ensure_u32, ByteReader, ByteWriter};
use crate::rules::RuleKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate on a length or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthPredicate {
    #[default]
    Any,
    Equal(usize),
    NotEqual(usize),
    GreaterThan(usize),
    GreaterOrEqual(usize),
    LessThan(usize),
    LessOrEqual(usize),
}

impl LengthPredicate {
    pub fn matches(self, len: usize) -> bool {
        match self {
            LengthPredicate::Any => true,
            LengthPredicate::Equal(n) => len == n,
            LengthPredicate::NotEqual(n) => len != n,
            LengthPredicate::GreaterThan(n) => len > n,
            LengthPredicate::GreaterOrEqual(n) => len >= n,
            LengthPredicate::LessThan(n) => len < n,
            LengthPredicate::LessOrEqual(n) => len <= n,
        }
    }

    fn parts(self) -> (u32, usize) {
        match self {
            LengthPredicate::Any => (0, 0),
            LengthPredicate::Equal(n) => (1, n),
            LengthPredicate::NotEqual(n) => (2, n),
            LengthPredicate::GreaterThan(n) => (3, n),
            LengthPredicate::GreaterOrEqual(n) => (4, n),
            LengthPredicate::LessThan(n) => (5, n),
            LengthPredicate::LessOrEqual(n) => (6, n),
        }
    }

    /// Checks that the bound fits the persisted form.
    pub fn validate(self, rule: RuleKind) -> Result<(), RuleError> {
        ensure_u32(rule, "length bound", self.parts().1)
    }

    pub(crate) fn save(self, writer: &mut ByteWriter) {
        let (code, n) = self.parts();
        writer.write_u32(code);
        writer.write_u32(n as u32);
    }

    pub(crate) fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        let code = reader.read_u32()?;
        let n = reader.read_u32()? as usize;
        Ok(match code {
            0 => LengthPredicate::Any,
            1 => LengthPredicate::Equal(n),
            2 => LengthPredicate::NotEqual(n),
            3 => LengthPredicate::GreaterThan(n),
            4 => LengthPredicate::GreaterOrEqual(n),
            5 => LengthPredicate::LessThan(n),
            6 => LengthPredicate::LessOrEqual(n),
            other => {
                return Err(RuleError::malformed(format!(
                    "unknown length predicate code {other}"
                )))
            }
        })
    }
}

impl fmt::Display for LengthPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthPredicate::Any => write!(f, "any"),
            LengthPredicate::Equal(n) => write!(f, "== {n}"),
            LengthPredicate::NotEqual(n) => write!(f, "!= {n}"),
            LengthPredicate::GreaterThan(n) => write!(f, "> {n}"),
            LengthPredicate::GreaterOrEqual(n) => write!(f, ">= {n}"),
            LengthPredicate::LessThan(n) => write!(f, "< {n}"),
            LengthPredicate::LessOrEqual(n) => write!(f, "<= {n}"),
        }
    }
}
