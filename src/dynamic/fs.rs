use crate::dynamic::{ListLoader, SourceStamp};
use crate::error::BoxError;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};

/// [`ListLoader`] that reads list files from disk.
///
/// Relative sources resolve against `base_dir` when one is set (normally the
/// directory of the ruleset that references them).
#[derive(Debug, Clone, Default)]
pub struct FsListLoader {
    base_dir: Option<PathBuf>,
}

impl FsListLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ListLoader for FsListLoader {
    fn stamp(&self, source: &str) -> Result<SourceStamp, BoxError> {
        let path = self.resolve(source);
        let metadata = fs::metadata(&path).map_err(|err| {
            format!("cannot stat list file {}: {err}", path.display())
        })?;
        Ok(SourceStamp {
            modified: FileTime::from_last_modification_time(&metadata),
            len: metadata.len(),
        })
    }

    fn load(&self, source: &str) -> Result<String, BoxError> {
        let path = self.resolve(source);
        fs::read_to_string(&path)
            .map_err(|err| format!("cannot read list file {}: {err}", path.display()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_source_uses_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vendors.txt"), "Acme\nGlobex\n").unwrap();

        let loader = FsListLoader::with_base_dir(dir.path());
        let stamp = loader.stamp("vendors.txt").unwrap();
        assert_eq!(stamp.len, 12);
        assert_eq!(loader.load("vendors.txt").unwrap(), "Acme\nGlobex\n");
    }

    #[test]
    fn test_stamp_tracks_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        fs::write(&path, "a\n").unwrap();
        let loader = FsListLoader::new();
        let source = path.to_string_lossy().to_string();
        let before = loader.stamp(&source).unwrap();

        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        let after = loader.stamp(&source).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_missing_file_is_error() {
        let loader = FsListLoader::new();
        let err = loader.stamp("/definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("cannot stat list file"));
    }
}
