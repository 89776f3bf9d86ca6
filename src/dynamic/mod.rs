//! File-backed ("dynamic") list entries.
//!
//! A list entry that starts with the configured prefix (`file://` by default)
//! names a file whose lines stand in for the entry. The descriptor is tag
//! expanded against the document, then loaded through the injected
//! [`ListLoader`]. Each rule instance owns a [`DynamicCache`] keyed by the
//! expanded path and the source's modification stamp.

pub mod fs;
pub mod tags;

use crate::error::{BoxError, RuleError};
use crate::rules::{RuleContext, RuleKind};
use crate::span::Document;
use filetime::FileTime;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub use fs::FsListLoader;
pub use tags::{DocumentTagExpander, TagError};

pub const DEFAULT_FILE_PREFIX: &str = "file://";

/// Separator between the two halves of a pair line in a list file.
pub const PAIR_DELIMITER: char = ';';

/// Identifies one version of a list source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStamp {
    pub modified: FileTime,
    pub len: u64,
}

/// Loads the raw contents of a list source.
pub trait ListLoader: Send + Sync {
    fn stamp(&self, source: &str) -> Result<SourceStamp, BoxError>;
    fn load(&self, source: &str) -> Result<String, BoxError>;
}

/// Resolves document tags inside a list descriptor before it is opened.
pub trait TagExpander: Send + Sync {
    fn expand(&self, text: &str, document: &Document) -> Result<String, BoxError>;
}

/// Split list file contents into entries.
///
/// Blank lines and `//` comment lines are skipped; a trailing `\r` is dropped.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with("//"))
        .map(str::to_string)
        .collect()
}

/// Split a pair line on the first [`PAIR_DELIMITER`]; a line without one maps
/// to an empty right-hand side.
pub fn split_pair(line: &str) -> (String, String) {
    match line.split_once(PAIR_DELIMITER) {
        Some((left, right)) => (left.to_string(), right.to_string()),
        None => (line.to_string(), String::new()),
    }
}

struct CachedList {
    source: String,
    stamp: SourceStamp,
    lines: Arc<Vec<String>>,
}

/// Per-rule cache of expanded list files, one entry per configured
/// descriptor. A descriptor whose tags expand to a different source replaces
/// its entry.
///
/// The lock is held while a source is (re)loaded, so concurrent callers of
/// one rule instance never populate the same source twice.
pub struct DynamicCache {
    entries: Mutex<HashMap<String, CachedList>>,
}

impl DynamicCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every cached expansion; the next resolve reloads from source.
    pub fn invalidate(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lines of the file named by `descriptor` (prefix already stripped).
    pub fn resolve(
        &self,
        descriptor: &str,
        ctx: &RuleContext<'_>,
        rule: RuleKind,
    ) -> Result<Arc<Vec<String>>, RuleError> {
        let source = ctx
            .services
            .tags()
            .expand(descriptor, ctx.document)
            .map_err(|err| RuleError::dependency(rule, "expand list tags", err))?;

        let loader = ctx.services.lists();
        let stamp = loader
            .stamp(&source)
            .map_err(|err| RuleError::dependency(rule, "stat list file", err))?;

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entries.get(descriptor) {
            if cached.source == source && cached.stamp == stamp {
                return Ok(Arc::clone(&cached.lines));
            }
            tracing::debug!(%rule, source = %source, "list source changed; reloading");
        }

        let content = loader
            .load(&source)
            .map_err(|err| RuleError::dependency(rule, "load list file", err))?;
        let lines = Arc::new(parse_lines(&content));
        tracing::debug!(%rule, source = %source, entries = lines.len(), "loaded list file");
        entries.insert(
            descriptor.to_string(),
            CachedList {
                source,
                stamp,
                lines: Arc::clone(&lines),
            },
        );
        Ok(lines)
    }

    /// Expand a value list: prefixed entries become the lines of their file.
    pub fn expand_values(
        &self,
        values: &[String],
        ctx: &RuleContext<'_>,
        rule: RuleKind,
    ) -> Result<Vec<String>, RuleError> {
        let prefix = ctx.services.file_prefix();
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            match value.strip_prefix(prefix) {
                Some(descriptor) if !prefix.is_empty() => {
                    out.extend(self.resolve(descriptor, ctx, rule)?.iter().cloned());
                }
                _ => out.push(value.clone()),
            }
        }
        Ok(out)
    }

    /// Expand a pair list: a pair whose left side carries the prefix and whose
    /// right side is empty becomes the `left;right` lines of its file.
    pub fn expand_pairs(
        &self,
        pairs: &[(String, String)],
        ctx: &RuleContext<'_>,
        rule: RuleKind,
    ) -> Result<Vec<(String, String)>, RuleError> {
        let prefix = ctx.services.file_prefix();
        let mut out = Vec::with_capacity(pairs.len());
        for (left, right) in pairs {
            match left.strip_prefix(prefix) {
                Some(descriptor) if !prefix.is_empty() && right.is_empty() => {
                    let lines = self.resolve(descriptor, ctx, rule)?;
                    out.extend(lines.iter().map(|line| split_pair(line)));
                }
                _ => out.push((left.clone(), right.clone())),
            }
        }
        Ok(out)
    }
}

impl Default for DynamicCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning a rule copies its configuration, never its cache.
impl Clone for DynamicCache {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for DynamicCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Services;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryLoader {
        content: Mutex<String>,
        stamp_secs: Mutex<i64>,
        loads: AtomicUsize,
    }

    impl MemoryLoader {
        fn new(content: &str) -> Self {
            Self {
                content: Mutex::new(content.to_string()),
                stamp_secs: Mutex::new(1),
                loads: AtomicUsize::new(0),
            }
        }
    }

    impl ListLoader for MemoryLoader {
        fn stamp(&self, _source: &str) -> Result<SourceStamp, BoxError> {
            Ok(SourceStamp {
                modified: FileTime::from_unix_time(*self.stamp_secs.lock().unwrap(), 0),
                len: self.content.lock().unwrap().len() as u64,
            })
        }

        fn load(&self, _source: &str) -> Result<String, BoxError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.content.lock().unwrap().clone())
        }
    }

    #[test]
    fn test_parse_lines_skips_blank_and_comments() {
        let lines = parse_lines("a\r\n\n// note\n  \nb;c\n");
        assert_eq!(lines, vec!["a".to_string(), "b;c".to_string()]);
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("k;v;w"), ("k".to_string(), "v;w".to_string()));
        assert_eq!(split_pair("k"), ("k".to_string(), String::new()));
    }

    #[test]
    fn test_cache_reuses_until_stamp_changes() {
        let loader = Arc::new(MemoryLoader::new("one\ntwo\n"));
        let services = Services::default().with_list_loader(loader.clone());
        let doc = Document::default();
        let ctx = services.context(&doc);
        let cache = DynamicCache::new();

        let values = vec!["zero".to_string(), "file://list.txt".to_string()];
        let expanded = cache.expand_values(&values, &ctx, RuleKind::ClosestValue).unwrap();
        assert_eq!(expanded, vec!["zero", "one", "two"]);
        cache.expand_values(&values, &ctx, RuleKind::ClosestValue).unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

        *loader.content.lock().unwrap() = "three\n".to_string();
        *loader.stamp_secs.lock().unwrap() = 2;
        let expanded = cache.expand_values(&values, &ctx, RuleKind::ClosestValue).unwrap();
        assert_eq!(expanded, vec!["zero", "three"]);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 2);

        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expand_pairs() {
        let loader = Arc::new(MemoryLoader::new("NY;New York\nCA;California\n"));
        let services = Services::default().with_list_loader(loader);
        let doc = Document::default();
        let ctx = services.context(&doc);
        let cache = DynamicCache::new();

        let pairs = vec![
            ("TX".to_string(), "Texas".to_string()),
            ("file://states.txt".to_string(), String::new()),
        ];
        let expanded = cache.expand_pairs(&pairs, &ctx, RuleKind::TranslateValue).unwrap();
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[2], ("CA".to_string(), "California".to_string()));
    }

    #[test]
    fn test_per_document_sources_share_one_entry() {
        let loader = Arc::new(MemoryLoader::new("x\n"));
        let services = Services::default().with_list_loader(loader.clone());
        let cache = DynamicCache::new();

        for name in ["scan-1", "scan-2", "scan-3", "scan-2"] {
            let doc = Document::new(name);
            cache
                .resolve("<SourceDocName>.txt", &services.context(&doc), RuleKind::ClosestValue)
                .unwrap();
            assert_eq!(cache.len(), 1);
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 4);

        let doc = Document::new("scan-2");
        cache
            .resolve("<SourceDocName>.txt", &services.context(&doc), RuleKind::ClosestValue)
            .unwrap();
        assert_eq!(loader.loads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_clone_starts_empty() {
        let loader = Arc::new(MemoryLoader::new("x\n"));
        let services = Services::default().with_list_loader(loader);
        let doc = Document::default();
        let ctx = services.context(&doc);
        let cache = DynamicCache::new();
        cache.resolve("a.txt", &ctx, RuleKind::ClosestValue).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.clone().is_empty());
    }
}
