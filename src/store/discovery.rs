//! Relationship discovery
//!
//! Scans a directory of rules and proposes relationships for every
//! unordered pair: an explicit textual reference wins and becomes a
//! strong `depends-on`; otherwise content similarity above a threshold
//! becomes an `extends` or `complements` edge marked semantic. Discovered
//! relationships are returned, never merged into the store; the caller
//! decides what to keep.

use super::store::RelationshipStore;
use super::types::{Relationship, RelationshipType};
use crate::analysis::{AnalysisResult, ContentAnalyzer, SimilarityEngine};
use crate::rules::{InventoryError, RuleDocument, RuleInventory};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A cooperative cancellation token.
///
/// The caller sets the token; discovery checks it between pair
/// comparisons and stops early with partial results.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Tunable discovery thresholds
///
/// The defaults reproduce the behavior observed in rule corpora, but they
/// are heuristics; calibrate against a labeled corpus before trusting
/// them elsewhere.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Minimum similarity for a semantic relationship
    pub similarity_threshold: f32,
    /// Similarity at which a semantic relationship reads as `extends`
    /// rather than `complements`
    pub extends_threshold: f32,
    /// Strength assigned to explicit-reference relationships
    pub reference_strength: f32,
    /// Concurrent pairwise comparisons
    pub max_concurrency: usize,
    /// Optional wall-clock budget for the whole pass
    pub timeout: Option<Duration>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            extends_threshold: 0.8,
            reference_strength: 0.9,
            max_concurrency: 4,
            timeout: None,
        }
    }
}

/// Errors that can fail a discovery pass outright
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

impl RelationshipStore {
    /// Discover relationships among the rules in a directory
    ///
    /// Returns proposals without merging them into the store. Cancellation
    /// and timeout stop the pass early with whatever was found so far.
    pub async fn discover_relationships(
        &self,
        directory: &Path,
        config: &DiscoveryConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<Relationship>, DiscoveryError> {
        let rules = RuleInventory::new().scan(directory)?;
        Ok(discover_among(&rules, config, cancel).await)
    }
}

/// Discover relationships among an already-scanned set of rules
pub async fn discover_among(
    rules: &[RuleDocument],
    config: &DiscoveryConfig,
    cancel: &CancellationToken,
) -> Vec<Relationship> {
    if rules.len() < 2 {
        return Vec::new();
    }

    let deadline = config.timeout.map(|t| Instant::now() + t);
    let analyzer = ContentAnalyzer::new();
    let engine = Arc::new(SimilarityEngine::new());

    // One analysis per rule, shared by every pair comparison
    let analyses: Arc<Vec<AnalysisResult>> = Arc::new(
        rules
            .iter()
            .map(|rule| analyzer.analyze_document(rule))
            .collect(),
    );

    let mut discovered = Vec::new();
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let mut pending = Vec::new();
    let mut stopped = false;

    'pairs: for i in 0..rules.len() {
        for j in (i + 1)..rules.len() {
            if cancel.is_cancelled() {
                warn!("discovery cancelled; returning partial results");
                stopped = true;
                break 'pairs;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!("discovery deadline reached; returning partial results");
                    stopped = true;
                    break 'pairs;
                }
            }

            // Explicit references trump similarity and need no scoring task
            if let Some(rel) = reference_relationship(&rules[i], &rules[j], config) {
                discovered.push(rel);
                continue;
            }

            let engine = Arc::clone(&engine);
            let analyses = Arc::clone(&analyses);
            let semaphore = Arc::clone(&semaphore);
            let source = rules[i].id.clone();
            let target = rules[j].id.clone();
            pending.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let score = engine.score(&analyses[i], &analyses[j]);
                Some((source, target, score))
            }));
        }
    }

    for handle in pending {
        let Ok(Some((source, target, score))) = handle.await else {
            continue;
        };
        if score < config.similarity_threshold {
            continue;
        }
        let relationship_type = if score >= config.extends_threshold {
            RelationshipType::Extends
        } else {
            RelationshipType::Complements
        };
        discovered.push(
            Relationship::new(source, target, relationship_type, score)
                .with_description("content similarity")
                .semantic(),
        );
    }

    debug!(
        "discovery proposed {} relationships{}",
        discovered.len(),
        if stopped { " (partial)" } else { "" }
    );
    discovered
}

/// An explicit-reference relationship between a pair, if either document
/// references the other
fn reference_relationship(
    a: &RuleDocument,
    b: &RuleDocument,
    config: &DiscoveryConfig,
) -> Option<Relationship> {
    if references(a, b) {
        return Some(explicit(a, b, config));
    }
    if references(b, a) {
        return Some(explicit(b, a, config));
    }
    None
}

fn explicit(source: &RuleDocument, target: &RuleDocument, config: &DiscoveryConfig) -> Relationship {
    Relationship::new(
        source.id.clone(),
        target.id.clone(),
        RelationshipType::DependsOn,
        config.reference_strength,
    )
    .with_description(format!(
        "{} references {}",
        source.id.file_name(),
        target.id.file_name()
    ))
}

/// Whether `source` explicitly references `target`: a declared dependency
/// resolving to it, or its id / file name appearing in the body
fn references(source: &RuleDocument, target: &RuleDocument) -> bool {
    let target_id = target.id.as_str();
    let target_name = target.id.file_name();

    if source.dependencies.iter().any(|dep| {
        dep.as_str() == target_id
            || dep.as_str() == target_name
            || target_id.ends_with(dep.as_str())
    }) {
        return true;
    }

    source.content.contains(target_id) || source.content.contains(target_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, content: &str) -> RuleDocument {
        RuleDocument::new(id, content)
    }

    #[tokio::test]
    async fn reference_becomes_depends_on() {
        let rules = vec![
            doc("rules/base.mdc", "# Base\n\nFoundation guidance.\n"),
            doc(
                "rules/derived.mdc",
                "# Derived\n\nFollows everything in base.mdc plus more.\n",
            ),
        ];

        let found = discover_among(&rules, &DiscoveryConfig::default(), &CancellationToken::new())
            .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source.as_str(), "rules/derived.mdc");
        assert_eq!(found[0].target.as_str(), "rules/base.mdc");
        assert_eq!(found[0].relationship_type, RelationshipType::DependsOn);
        assert!(!found[0].semantic);
        assert!((found[0].strength - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn declared_dependency_counts_as_reference() {
        let mut dependent = doc("a.mdc", "# Alpha\n\nGuidance.\n");
        dependent.dependencies.push("b.mdc".into());
        let rules = vec![dependent, doc("b.mdc", "# Beta\n\nOther guidance.\n")];

        let found = discover_among(&rules, &DiscoveryConfig::default(), &CancellationToken::new())
            .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source.as_str(), "a.mdc");
        assert_eq!(found[0].relationship_type, RelationshipType::DependsOn);
    }

    #[tokio::test]
    async fn similar_content_yields_semantic_relationship() {
        let shared = "# Rule Graph\n\nRules form a graph of relationships; every rule links \
                      to related rules through weighted relationship edges.\n";
        let rules = vec![
            doc("one.mdc", shared),
            doc(
                "two.mdc",
                "# Relationship Graph\n\nEvery rule links into the graph of relationships; \
                 weighted relationship edges connect related rules.\n",
            ),
        ];

        let found = discover_among(&rules, &DiscoveryConfig::default(), &CancellationToken::new())
            .await;

        assert_eq!(found.len(), 1);
        assert!(found[0].semantic);
        assert!(found[0].strength >= 0.5);
        assert!(matches!(
            found[0].relationship_type,
            RelationshipType::Extends | RelationshipType::Complements
        ));
    }

    #[tokio::test]
    async fn unrelated_content_yields_nothing() {
        let rules = vec![
            doc(
                "viz.mdc",
                "# Visualization\n\nRender the graph layout with nodes and links.\n",
            ),
            doc(
                "http.mdc",
                "# Requests\n\nConfigure client timeout retry policy connection pooling.\n",
            ),
        ];

        let found = discover_among(&rules, &DiscoveryConfig::default(), &CancellationToken::new())
            .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_early() {
        let rules: Vec<RuleDocument> = (0..20)
            .map(|i| doc(&format!("r{}.mdc", i), "# Rule\n\nShared graph guidance.\n"))
            .collect();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let found = discover_among(&rules, &DiscoveryConfig::default(), &cancel).await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn fewer_than_two_rules_is_empty() {
        let rules = vec![doc("only.mdc", "# Only\n\nAlone.\n")];
        let found = discover_among(&rules, &DiscoveryConfig::default(), &CancellationToken::new())
            .await;
        assert!(found.is_empty());
    }
}
