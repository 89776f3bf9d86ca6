use serde::{Deserialize, Serialize};
use std::fmt;

/// Which match(es) of a pattern an operation acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Occurrence {
    #[default]
    All,
    First,
    Last,
    /// 1-based match number.
    Specified(u32),
}

/// A concrete selection over a known number of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Every,
    Index(usize),
}

/// Raised when an occurrence index cannot describe any match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOccurrence(pub i32);

impl fmt::Display for InvalidOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "occurrence index {} must be positive", self.0)
    }
}

impl std::error::Error for InvalidOccurrence {}

impl Occurrence {
    /// Build a `Specified` occurrence, rejecting non-positive indices.
    pub fn specified(n: i32) -> Result<Self, InvalidOccurrence> {
        if n <= 0 {
            return Err(InvalidOccurrence(n));
        }
        Ok(Occurrence::Specified(n as u32))
    }

    /// Integer form: All → 0, First → 1, Last → -1, Specified(n) → n.
    pub fn to_index(self) -> i32 {
        match self {
            Occurrence::All => 0,
            Occurrence::First => 1,
            Occurrence::Last => -1,
            Occurrence::Specified(n) => n as i32,
        }
    }

    /// Inverse of [`Occurrence::to_index`].
    pub fn from_index(index: i32) -> Result<Self, InvalidOccurrence> {
        match index {
            0 => Ok(Occurrence::All),
            1 => Ok(Occurrence::First),
            -1 => Ok(Occurrence::Last),
            n => Occurrence::specified(n),
        }
    }

    /// Check that a deserialized value is usable.
    pub fn validate(self) -> Result<(), InvalidOccurrence> {
        match self {
            Occurrence::Specified(0) => Err(InvalidOccurrence(0)),
            _ => Ok(()),
        }
    }

    /// Resolve against `count` matches. `None` means nothing is selected.
    pub fn select(self, count: usize) -> Option<Selection> {
        if count == 0 {
            return None;
        }
        match self {
            Occurrence::All => Some(Selection::Every),
            Occurrence::First => Some(Selection::Index(0)),
            Occurrence::Last => Some(Selection::Index(count - 1)),
            Occurrence::Specified(n) => {
                let n = n as usize;
                (n >= 1 && n <= count).then(|| Selection::Index(n - 1))
            }
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occurrence::All => write!(f, "all"),
            Occurrence::First => write!(f, "first"),
            Occurrence::Last => write!(f, "last"),
            Occurrence::Specified(n) => write!(f, "#{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_mapping() {
        assert_eq!(Occurrence::All.to_index(), 0);
        assert_eq!(Occurrence::First.to_index(), 1);
        assert_eq!(Occurrence::Last.to_index(), -1);
        assert_eq!(Occurrence::Specified(4).to_index(), 4);
        assert_eq!(Occurrence::from_index(-1), Ok(Occurrence::Last));
        assert_eq!(Occurrence::from_index(7), Ok(Occurrence::Specified(7)));
    }

    #[test]
    fn test_specified_rejects_non_positive() {
        assert_eq!(Occurrence::specified(0), Err(InvalidOccurrence(0)));
        assert_eq!(Occurrence::specified(-3), Err(InvalidOccurrence(-3)));
        assert!(Occurrence::Specified(0).validate().is_err());
    }

    #[test]
    fn test_select() {
        assert_eq!(Occurrence::All.select(3), Some(Selection::Every));
        assert_eq!(Occurrence::Last.select(3), Some(Selection::Index(2)));
        assert_eq!(Occurrence::Specified(2).select(3), Some(Selection::Index(1)));
        assert_eq!(Occurrence::Specified(4).select(3), None);
        assert_eq!(Occurrence::First.select(0), None);
    }
}
