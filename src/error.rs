use crate::rules::RuleKind;
use thiserror::Error;

/// Boxed error carried across collaborator boundaries (regex engine, list
/// loader, tag expander).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by rule configuration, persistence, and application.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid {rule} configuration: {message}")]
    Configuration { rule: RuleKind, message: String },

    #[error("{rule} data version {found} is newer than supported version {supported}")]
    FutureFormat {
        rule: RuleKind,
        found: u32,
        supported: u32,
    },

    #[error("{rule} failed during {operation}: {source}")]
    Dependency {
        rule: RuleKind,
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("malformed persisted rule data: {message}")]
    Malformed { message: String },

    #[error("internal invariant violated: {0}")]
    Logic(String),
}

impl RuleError {
    pub(crate) fn config(rule: RuleKind, message: impl Into<String>) -> Self {
        RuleError::Configuration {
            rule,
            message: message.into(),
        }
    }

    pub(crate) fn dependency(
        rule: RuleKind,
        operation: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        RuleError::Dependency {
            rule,
            operation,
            source: source.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        RuleError::Malformed {
            message: message.into(),
        }
    }

    /// True for errors detected while configuring a rule.
    pub fn is_configuration(&self) -> bool {
        matches!(self, RuleError::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err = RuleError::dependency(RuleKind::ClosestValue, "load list", io);
        let source = std::error::Error::source(&err).expect("source");
        assert!(source.to_string().contains("missing.txt"));
        assert!(err.to_string().contains("load list"));
    }

    #[test]
    fn test_configuration_display() {
        let err = RuleError::config(RuleKind::Limit, "end precedes start");
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "invalid limit configuration: end precedes start"
        );
    }
}
