//! Icon file discovery
//!
//! Expands an input's glob pattern below its base directory. Paths are
//! returned relative to the base directory, `/`-separated, sorted.

// Directory walking is synchronous; callers run it on the blocking pool
#![allow(clippy::disallowed_methods)]

use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, SpriteError};

/// Finds the files matched by an input pattern
pub trait Discovery: Send + Sync + std::fmt::Debug {
    /// Relative paths (with `/` separators) of every file under `base_dir`
    /// matching `pattern`, in sorted order. A missing base directory yields
    /// no paths.
    fn discover(&self, pattern: &str, base_dir: &Path) -> Result<Vec<String>>;
}

/// Filesystem discovery using walkdir + globset
///
/// Hidden files and directories are skipped and symlinks are followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobDiscovery;

impl GlobDiscovery {
    pub fn new() -> Self {
        Self
    }
}

/// Compile a glob where `*` does not cross directory separators
pub(crate) fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| SpriteError::invalid_pattern("glob", pattern, e))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

impl Discovery for GlobDiscovery {
    fn discover(&self, pattern: &str, base_dir: &Path) -> Result<Vec<String>> {
        let matcher = compile_glob(pattern)?;

        if !base_dir.is_dir() {
            tracing::debug!(
                "[fob-sprite] Base directory {} does not exist, no icons discovered",
                base_dir.display()
            );
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(base_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(|e| SpriteError::Discovery {
                base_dir: base_dir.to_path_buf(),
                reason: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(base_dir) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if matcher.is_match(&relative) {
                found.push(relative);
            }
        }

        found.sort();
        Ok(found)
    }
}
