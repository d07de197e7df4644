//! Reference tracking for pruned production sprites.

use std::sync::Arc;

use crate::filter::SourceFilter;
use crate::matcher::ReferenceMatcher;
use crate::resolve::SymbolMap;

/// Accumulates the symbols referenced by processed modules
///
/// The used map only grows, and only with ids present in the full map.
/// Ids are kept in first-seen order; composition sorts them anyway.
#[derive(Debug)]
pub struct ReferenceTracker {
    full: Arc<SymbolMap>,
    used: SymbolMap,
    filter: Arc<SourceFilter>,
    matcher: Arc<dyn ReferenceMatcher>,
}

impl ReferenceTracker {
    /// Create a tracker with `whitelist` already applied
    pub fn new(
        full: Arc<SymbolMap>,
        filter: Arc<SourceFilter>,
        matcher: Arc<dyn ReferenceMatcher>,
        whitelist: &[String],
    ) -> Self {
        let mut tracker = Self {
            full,
            used: SymbolMap::default(),
            filter,
            matcher,
        };
        for id in whitelist {
            tracker.mark_used(id);
        }
        tracker
    }

    fn mark_used(&mut self, id: &str) -> bool {
        if self.used.contains_key(id) {
            return false;
        }
        match self.full.get(id) {
            Some(entry) => {
                self.used.insert(id.to_string(), entry.clone());
                true
            }
            None => false,
        }
    }

    /// Scan one module; returns the ids this call added
    pub fn scan(&mut self, module_path: &str, module_text: &str) -> Vec<String> {
        if !self.filter.matches(module_path) {
            return Vec::new();
        }

        let matcher = Arc::clone(&self.matcher);
        let added: Vec<String> = matcher
            .find_references(module_text)
            .into_iter()
            .filter(|id| self.mark_used(id))
            .map(str::to_string)
            .collect();

        if !added.is_empty() {
            tracing::debug!(
                "[fob-sprite] {} references {} new icon(s): {}",
                module_path,
                added.len(),
                added.join(", ")
            );
        }

        added
    }

    pub fn used(&self) -> &SymbolMap {
        &self.used
    }

    pub fn into_used(self) -> SymbolMap {
        self.used
    }
}
