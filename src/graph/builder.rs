//! Graph builder
//!
//! Turns a rule inventory and a relationship set into filtered nodes and
//! links. Every link in the output connects two surviving nodes; metrics
//! come from the surviving link set only.

use super::types::{GraphLink, GraphNode, GraphOptions, GroupBy, NodeMetrics, VisualizationData};
use crate::rules::{RuleDocument, RuleId};
use crate::store::Relationship;
use std::collections::HashSet;

/// Builds visualization graphs from rules and relationships
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Generate the node/link graph
    ///
    /// Empty inputs produce an empty, valid graph. Direction convention:
    /// a link A→B reads "A depends on B", so it counts in A's
    /// `dependencies` and B's `dependents`.
    pub fn generate(
        &self,
        rules: &[RuleDocument],
        relationships: &[Relationship],
        options: &GraphOptions,
    ) -> VisualizationData {
        let filtered_rules: Vec<&RuleDocument> = rules
            .iter()
            .filter(|rule| match &options.include_types {
                Some(types) => types.contains(&rule.current_type),
                None => true,
            })
            .collect();

        let surviving: HashSet<&RuleId> = filtered_rules.iter().map(|r| &r.id).collect();

        // A link is valid only when strong enough and both endpoints survive
        let links: Vec<GraphLink> = relationships
            .iter()
            .filter(|rel| rel.strength >= options.min_relationship_strength)
            .filter(|rel| options.show_semantic_connections || !rel.semantic)
            .filter(|rel| surviving.contains(&rel.source) && surviving.contains(&rel.target))
            .map(|rel| GraphLink {
                source: rel.source.clone(),
                target: rel.target.clone(),
                link_type: rel.relationship_type.as_str().to_string(),
                strength: rel.strength,
                semantic: rel.semantic,
            })
            .collect();

        let mut nodes: Vec<GraphNode> = Vec::with_capacity(filtered_rules.len());
        let mut seen = HashSet::new();
        for rule in &filtered_rules {
            if !seen.insert(&rule.id) {
                continue;
            }
            nodes.push(GraphNode {
                id: rule.id.clone(),
                label: rule.id.file_name().to_string(),
                rule_type: rule.current_type,
                group: group_label(rule, options.group_by),
                metrics: NodeMetrics::default(),
                concepts: None,
                content_type: None,
                thematic_groups: None,
                highlighted: options.highlight_rules.contains(&rule.id),
            });
        }

        if !options.show_orphaned_nodes {
            nodes.retain(|node| {
                links
                    .iter()
                    .any(|l| l.source == node.id || l.target == node.id)
            });
        }

        let mut data = VisualizationData { nodes, links };
        recompute_metrics(&mut data);
        data
    }
}

/// Resolve a node's display group
///
/// Content-type and thematic grouping need analysis results and are
/// finalized by the enhancer; until then those nodes group by type.
fn group_label(rule: &RuleDocument, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Type | GroupBy::ContentType | GroupBy::Thematic => {
            rule.current_type.as_str().to_string()
        }
        GroupBy::Directory => rule.id.directory().to_string(),
    }
}

/// Recompute every node's metrics from the current link set
pub(crate) fn recompute_metrics(data: &mut VisualizationData) {
    for node in &mut data.nodes {
        let mut dependencies = 0;
        let mut dependents = 0;
        let mut strength_sum = 0.0f32;
        let mut incident = 0usize;

        for link in &data.links {
            if link.source == node.id {
                dependencies += 1;
            }
            if link.target == node.id {
                dependents += 1;
            }
            if link.source == node.id || link.target == node.id {
                strength_sum += link.strength;
                incident += 1;
            }
        }

        node.metrics = NodeMetrics {
            dependencies,
            dependents,
            strength: if incident > 0 {
                strength_sum / incident as f32
            } else {
                0.0
            },
        };
    }
}
