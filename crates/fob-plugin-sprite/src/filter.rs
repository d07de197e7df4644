//! Include/exclude filter deciding which modules are scanned for icon
//! references.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

use crate::error::{Result, SpriteError};

/// Patterns always excluded from scanning
pub const ALWAYS_EXCLUDE: &[&str] = &["**/node_modules/**"];

/// Default include pattern for scanned modules
pub const DEFAULT_INCLUDE: &str = "**/*.[jt]sx";

/// Glob filter over module ids
///
/// Ids are matched both as given and relative to the project root. An empty
/// include list accepts every id that is not excluded.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    root: PathBuf,
    include: GlobSet,
    include_empty: bool,
    exclude: GlobSet,
}

fn build_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| SpriteError::invalid_pattern("filter", pattern, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SpriteError::invalid_pattern("filter", "<set>", e))
}

impl SourceFilter {
    pub fn new(root: impl Into<PathBuf>, include: &[String], exclude: &[String]) -> Result<Self> {
        let include_set = build_set(include.iter().map(String::as_str))?;
        let exclude_set = build_set(
            exclude
                .iter()
                .map(String::as_str)
                .chain(ALWAYS_EXCLUDE.iter().copied()),
        )?;

        Ok(Self {
            root: root.into(),
            include: include_set,
            include_empty: include.is_empty(),
            exclude: exclude_set,
        })
    }

    /// Whether the module with this id should be scanned
    pub fn matches(&self, id: &str) -> bool {
        // Drop any `?query` suffix appended by the bundler
        let id = id.split_once('?').map_or(id, |(path, _)| path);
        let path = Path::new(id);
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        if self.exclude.is_match(path) || self.exclude.is_match(relative) {
            return false;
        }
        self.include_empty || self.include.is_match(relative) || self.include.is_match(path)
    }
}
