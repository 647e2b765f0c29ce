//! Analysis cache keyed by rule id and revalidated by content hash
//!
//! A file-system watcher (external to this crate) only needs to call
//! `invalidate` for a changed rule; the hash check makes even that
//! optional, since a rescan produces a new content hash.

use super::analyzer::ContentAnalyzer;
use super::types::AnalysisResult;
use crate::rules::{RuleDocument, RuleId};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CacheEntry {
    content_hash: String,
    result: Arc<AnalysisResult>,
}

/// Concurrent cache of per-rule analysis results
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: DashMap<RuleId, CacheEntry>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get the cached result for a rule, analyzing (and caching) on a miss
    /// or when the rule's content hash no longer matches
    pub fn get_or_analyze(
        &self,
        analyzer: &ContentAnalyzer,
        rule: &RuleDocument,
    ) -> Arc<AnalysisResult> {
        if let Some(entry) = self.entries.get(&rule.id) {
            if entry.content_hash == rule.content_hash {
                return Arc::clone(&entry.result);
            }
        }

        let result = Arc::new(analyzer.analyze_document(rule));
        self.entries.insert(
            rule.id.clone(),
            CacheEntry {
                content_hash: rule.content_hash.clone(),
                result: Arc::clone(&result),
            },
        );
        result
    }

    /// Drop the cached result for a rule (external change notification hook)
    pub fn invalidate(&self, rule_id: &RuleId) {
        self.entries.remove(rule_id);
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_returns_shared_result() {
        let cache = AnalysisCache::new();
        let analyzer = ContentAnalyzer::new();
        let rule = RuleDocument::new("a.mdc", "# Alpha\n\nContent about graphs.\n");

        let first = cache.get_or_analyze(&analyzer, &rule);
        let second = cache.get_or_analyze(&analyzer, &rule);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_content_reanalyzes() {
        let cache = AnalysisCache::new();
        let analyzer = ContentAnalyzer::new();
        let rule = RuleDocument::new("a.mdc", "# Alpha\n\nOriginal content.\n");
        let first = cache.get_or_analyze(&analyzer, &rule);

        let updated = RuleDocument::new("a.mdc", "# Alpha\n\nRewritten content entirely.\n");
        let second = cache.get_or_analyze(&analyzer, &updated);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_entry() {
        let cache = AnalysisCache::new();
        let analyzer = ContentAnalyzer::new();
        let rule = RuleDocument::new("a.mdc", "content");
        cache.get_or_analyze(&analyzer, &rule);
        assert_eq!(cache.len(), 1);

        cache.invalidate(&rule.id);
        assert!(cache.is_empty());
    }
}
