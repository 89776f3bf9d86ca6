pub mod applicator;
pub mod loader;
pub mod schema;
pub mod version;

pub use applicator::{
    ApplicationError, ApplyReport, CompiledRule, CompiledRuleSet, RuleApplication, RuleOutcome,
};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    FailurePolicy, Metadata, RuleDefinition, RuleSet, ValidationError, ValidationIssue,
};
pub use version::{check_library_version, matches_requirement, VersionError, LIBRARY_VERSION};
