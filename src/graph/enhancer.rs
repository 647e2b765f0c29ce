//! Graph enhancer
//!
//! Post-processes a built graph: attaches analysis-derived metadata to
//! nodes, injects similarity-derived links for unconnected pairs, applies
//! content-type filtering and second-pass grouping, and recomputes
//! metrics from the final link set. Re-running on the same graph adds
//! nothing: an existing edge between a pair, in either direction,
//! suppresses injection.

use super::builder::recompute_metrics;
use super::types::{GraphLink, GraphOptions, GroupBy, VisualizationData, SEMANTIC_LINK_TYPE};
use crate::analysis::{AnalysisCache, AnalysisResult, ContentAnalyzer, SimilarityEngine};
use crate::rules::{RuleDocument, RuleId};
use crate::store::Relationship;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Default minimum similarity for an injected semantic link
const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.5;

/// Attaches semantic metadata and similarity-derived links to a graph
pub struct GraphEnhancer {
    analyzer: ContentAnalyzer,
    engine: SimilarityEngine,
    cache: AnalysisCache,
    semantic_threshold: f32,
}

impl Default for GraphEnhancer {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEnhancer {
    pub fn new() -> Self {
        Self {
            analyzer: ContentAnalyzer::new(),
            engine: SimilarityEngine::new(),
            cache: AnalysisCache::new(),
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
        }
    }

    /// Override the semantic-connection threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    /// The cache invalidation hook for external change notifications
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Enhance a built graph in place
    pub fn enhance(
        &self,
        data: &mut VisualizationData,
        rules: &[RuleDocument],
        relationships: &[Relationship],
        options: &GraphOptions,
    ) {
        let by_id: HashMap<&RuleId, &RuleDocument> = rules.iter().map(|r| (&r.id, r)).collect();

        // Per-node analysis, aligned with data.nodes
        let mut analyses: Vec<Option<Arc<AnalysisResult>>> = Vec::with_capacity(data.nodes.len());
        for node in &mut data.nodes {
            let Some(rule) = by_id.get(&node.id) else {
                analyses.push(None);
                continue;
            };
            let analysis = self.cache.get_or_analyze(&self.analyzer, rule);

            node.concepts = Some(analysis.concepts());
            node.content_type = Some(analysis.classification.to_string());
            let mut groups = analysis.themes.clone();
            if groups.is_empty() {
                groups.push("general".to_string());
            }
            node.thematic_groups = Some(groups);

            analyses.push(Some(analysis));
        }

        if options.show_semantic_connections {
            self.inject_semantic_links(data, relationships, &analyses);
        }

        if let Some(content_types) = &options.content_types {
            filter_by_content_type(data, content_types);
        }

        apply_grouping(data, options.group_by);
        recompute_metrics(data);
    }

    /// Add a semantic link for every unordered node pair that is
    /// sufficiently similar and not already connected
    fn inject_semantic_links(
        &self,
        data: &mut VisualizationData,
        relationships: &[Relationship],
        analyses: &[Option<Arc<AnalysisResult>>],
    ) {
        let mut injected = Vec::new();
        for i in 0..data.nodes.len() {
            for j in (i + 1)..data.nodes.len() {
                let (a, b) = (&data.nodes[i].id, &data.nodes[j].id);
                if data.links.iter().any(|l| l.connects(a, b)) {
                    continue;
                }
                if relationships.iter().any(|r| {
                    (&r.source == a && &r.target == b) || (&r.source == b && &r.target == a)
                }) {
                    continue;
                }

                let (Some(analysis_a), Some(analysis_b)) = (&analyses[i], &analyses[j]) else {
                    continue;
                };
                let score = self.engine.score(analysis_a, analysis_b);
                if score >= self.semantic_threshold {
                    injected.push(GraphLink {
                        source: a.clone(),
                        target: b.clone(),
                        link_type: SEMANTIC_LINK_TYPE.to_string(),
                        strength: score,
                        semantic: true,
                    });
                }
            }
        }

        if !injected.is_empty() {
            debug!("injected {} semantic links", injected.len());
            data.links.extend(injected);
        }
    }
}

/// Keep only nodes whose content type is in the list, then drop links
/// left dangling
fn filter_by_content_type(data: &mut VisualizationData, content_types: &[String]) {
    data.nodes.retain(|node| {
        node.content_type
            .as_ref()
            .map(|ct| content_types.iter().any(|w| w.eq_ignore_ascii_case(ct)))
            .unwrap_or(false)
    });
    let ids: Vec<RuleId> = data.nodes.iter().map(|n| n.id.clone()).collect();
    data.links
        .retain(|l| ids.contains(&l.source) && ids.contains(&l.target));
}

/// Second-pass grouping for the modes that need analysis results
fn apply_grouping(data: &mut VisualizationData, group_by: GroupBy) {
    match group_by {
        GroupBy::ContentType => {
            for node in &mut data.nodes {
                if let Some(content_type) = &node.content_type {
                    node.group = content_type.clone();
                }
            }
        }
        GroupBy::Thematic => {
            for node in &mut data.nodes {
                if let Some(first) = node.thematic_groups.as_ref().and_then(|g| g.first()) {
                    node.group = first.clone();
                }
            }
        }
        GroupBy::Type | GroupBy::Directory => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::store::RelationshipType;

    const ARCHITECTURE_ONE: &str = "\
# Architecture

System architecture guidance: components, modules, and structure of the
rule graph. Keep the architecture layered and the components small.
";

    const ARCHITECTURE_TWO: &str = "\
# Architecture

More architecture guidance for the rule graph: structure components into
modules, keep the system layered.
";

    const TESTING_DOC: &str = "\
# Testing Standards

Write unit tests first. Quality assurance needs verification and
validation for every change.
";

    fn corpus() -> Vec<RuleDocument> {
        vec![
            RuleDocument::new("rule1.mdc", ARCHITECTURE_ONE),
            RuleDocument::new("rule2.mdc", TESTING_DOC),
            RuleDocument::new("rule3.mdc", ARCHITECTURE_TWO),
        ]
    }

    fn build_and_enhance(
        rules: &[RuleDocument],
        relationships: &[Relationship],
        options: &GraphOptions,
    ) -> VisualizationData {
        let mut data = GraphBuilder::new().generate(rules, relationships, options);
        GraphEnhancer::new().enhance(&mut data, rules, relationships, options);
        data
    }

    #[test]
    fn nodes_gain_semantic_metadata() {
        let rules = corpus();
        let data = build_and_enhance(&rules, &[], &GraphOptions::default());

        for node in &data.nodes {
            assert!(node.concepts.as_ref().is_some_and(|c| !c.is_empty()));
            assert!(node.content_type.is_some());
            assert!(node.thematic_groups.as_ref().is_some_and(|g| !g.is_empty()));
        }

        let rule1 = data.nodes.iter().find(|n| n.id.as_str() == "rule1.mdc").unwrap();
        assert_eq!(
            rule1.thematic_groups.as_ref().unwrap()[0],
            "Architecture",
            "first thematic group is the first heading"
        );
    }

    #[test]
    fn semantic_link_connects_similar_rules_only() {
        let rules = corpus();
        let data = build_and_enhance(&rules, &[], &GraphOptions::default());

        let semantic: Vec<&GraphLink> = data.links.iter().filter(|l| l.semantic).collect();
        assert!(
            semantic
                .iter()
                .any(|l| l.connects(&RuleId::from("rule1.mdc"), &RuleId::from("rule3.mdc"))),
            "rule1 and rule3 share vocabulary and should connect"
        );
        assert!(
            !semantic
                .iter()
                .any(|l| l.connects(&RuleId::from("rule2.mdc"), &RuleId::from("rule1.mdc"))),
            "testing standards should not connect to architecture"
        );
        for link in semantic {
            assert_eq!(link.link_type, SEMANTIC_LINK_TYPE);
            assert!(link.strength >= 0.5);
        }
    }

    #[test]
    fn enhancement_is_idempotent() {
        let rules = corpus();
        let options = GraphOptions::default();
        let enhancer = GraphEnhancer::new();

        let mut data = GraphBuilder::new().generate(&rules, &[], &options);
        enhancer.enhance(&mut data, &rules, &[], &options);
        let after_first = data.links.len();

        enhancer.enhance(&mut data, &rules, &[], &options);
        assert_eq!(data.links.len(), after_first);
    }

    #[test]
    fn existing_relationship_suppresses_injection() {
        let rules = corpus();
        let relationships = vec![Relationship::new(
            "rule1.mdc",
            "rule3.mdc",
            RelationshipType::Extends,
            0.9,
        )];
        let data = build_and_enhance(&rules, &relationships, &GraphOptions::default());

        let between: Vec<&GraphLink> = data
            .links
            .iter()
            .filter(|l| l.connects(&RuleId::from("rule1.mdc"), &RuleId::from("rule3.mdc")))
            .collect();
        assert_eq!(between.len(), 1);
        assert!(!between[0].semantic);
    }

    #[test]
    fn semantic_connections_can_be_disabled() {
        let rules = corpus();
        let options = GraphOptions {
            show_semantic_connections: false,
            ..Default::default()
        };
        let data = build_and_enhance(&rules, &[], &options);
        assert!(data.links.iter().all(|l| !l.semantic));
    }

    #[test]
    fn thematic_grouping_uses_first_theme() {
        let rules = corpus();
        let options = GraphOptions {
            group_by: GroupBy::Thematic,
            ..Default::default()
        };
        let data = build_and_enhance(&rules, &[], &options);

        let rule1 = data.nodes.iter().find(|n| n.id.as_str() == "rule1.mdc").unwrap();
        assert_eq!(rule1.group, "Architecture");
    }

    #[test]
    fn content_type_filter_drops_nodes_and_dangling_links() {
        let mut rules = corpus();
        // A config-shaped rule that nothing resembles
        rules.push(RuleDocument::new(
            "settings.mdc",
            "retries: 3\ntimeout: 30\nverbose: false\nmode: default\n",
        ));

        let options = GraphOptions {
            content_types: Some(vec!["config".to_string()]),
            ..Default::default()
        };
        let data = build_and_enhance(&rules, &[], &options);

        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].id.as_str(), "settings.mdc");
        assert!(data
            .links
            .iter()
            .all(|l| l.source.as_str() == "settings.mdc" && l.target.as_str() == "settings.mdc"));
    }

    #[test]
    fn metrics_recomputed_after_injection() {
        let rules = corpus();
        let data = build_and_enhance(&rules, &[], &GraphOptions::default());

        let rule1 = data.nodes.iter().find(|n| n.id.as_str() == "rule1.mdc").unwrap();
        // The injected rule1↔rule3 link must show up in rule1's metrics
        assert!(rule1.metrics.dependencies + rule1.metrics.dependents >= 1);
        assert!(rule1.metrics.strength > 0.0);
    }
}
