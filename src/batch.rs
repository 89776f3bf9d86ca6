//! JSON attribute files: one document plus the attributes extracted from it.
//!
//! ```json
//! {
//!   "document": { "source_name": "scan-001.tif", "text": "...", "tags": {} },
//!   "attributes": [ { "name": "Total", "value": "12.00", "type": "Money" } ]
//! }
//! ```

use crate::span::{Attribute, Document};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFile {
    #[serde(default)]
    pub document: Document,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid attribute file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AttributeFile {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| BatchError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> String {
        let mut out = serde_json::to_string_pretty(self).unwrap_or_default();
        out.push('\n');
        out
    }

    /// Replace `path` atomically with this file's JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), BatchError> {
        let path = path.as_ref();
        atomic_write(path, self.to_json().as_bytes()).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Tempfile in the target directory, fsync, rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
