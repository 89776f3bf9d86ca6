use crate::config::schema::{RuleSet, ValidationError};
use crate::config::version::{check_library_version, VersionError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Version {
        path: Option<PathBuf>,
        source: VersionError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = Some(path.to_path_buf());
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml { path, source },
            ConfigError::Validation { path: None, source } => {
                ConfigError::Validation { path, source }
            }
            ConfigError::Version { path: None, source } => ConfigError::Version { path, source },
            other => other,
        }
    }

    /// Path of the ruleset file, when the error came from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. }
            | ConfigError::Validation { path, .. }
            | ConfigError::Version { path, .. } => path.as_deref(),
        }
    }
}

fn location(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read ruleset from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "failed to parse ruleset TOML{}: {}", location(path), source)
            }
            ConfigError::Validation { path, source } => {
                write!(f, "invalid ruleset{}: {}", location(path), source)
            }
            ConfigError::Version { path, source } => {
                write!(f, "incompatible ruleset{}: {}", location(path), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::Version { source, .. } => Some(source),
        }
    }
}

/// Parse, version-check, and validate a ruleset.
pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    let set: RuleSet = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    check_library_version(set.meta.requires.as_deref())
        .map_err(|source| ConfigError::Version { path: None, source })?;
    set.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(set)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loading ruleset");
    load_from_str(&contents).map_err(|error| error.with_path(path))
}
