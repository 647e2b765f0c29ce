//! Visualization graph types
//!
//! Field names and shapes are a stable contract for downstream HTML/JSON
//! renderers; changing them breaks every consumer.

use crate::rules::{RuleId, RuleType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Link type label for similarity-derived edges
pub const SEMANTIC_LINK_TYPE: &str = "semantic-similarity";

/// How nodes are grouped for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    #[default]
    Type,
    Directory,
    ContentType,
    Thematic,
}

impl GroupBy {
    /// Parse a grouping string; unknown values fall back to type-based
    /// grouping with a warning rather than failing the visualization.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "type" => Self::Type,
            "directory" => Self::Directory,
            "contenttype" | "content-type" | "content_type" => Self::ContentType,
            "thematic" => Self::Thematic,
            other => {
                warn!("unknown groupBy '{}'; falling back to type", other);
                Self::Type
            }
        }
    }
}

/// Options controlling graph construction and enhancement
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Keep only rules of these types; None keeps everything
    pub include_types: Option<Vec<RuleType>>,
    /// Drop relationships weaker than this
    pub min_relationship_strength: f32,
    pub group_by: GroupBy,
    /// Keep nodes with no incident links
    pub show_orphaned_nodes: bool,
    /// Nodes to tag as highlighted (never removed)
    pub highlight_rules: Vec<RuleId>,
    /// Inject similarity-derived links during enhancement
    pub show_semantic_connections: bool,
    /// Keep only nodes with these content types (enhancement pass)
    pub content_types: Option<Vec<String>>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            include_types: None,
            min_relationship_strength: 0.0,
            group_by: GroupBy::Type,
            show_orphaned_nodes: true,
            highlight_rules: Vec::new(),
            show_semantic_connections: true,
            content_types: None,
        }
    }
}

/// Per-node connectivity metrics, computed from the valid link set only
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Outgoing valid links: rules this node depends on
    pub dependencies: usize,
    /// Incoming valid links: rules depending on this node
    pub dependents: usize,
    /// Mean strength of incident valid links
    pub strength: f32,
}

/// A rule rendered as a graph node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: RuleId,
    pub label: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub group: String,
    pub metrics: NodeMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concepts: Option<Vec<String>>,
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "thematicGroups", skip_serializing_if = "Option::is_none")]
    pub thematic_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub highlighted: bool,
}

/// A relationship rendered as a graph link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: RuleId,
    pub target: RuleId,
    #[serde(rename = "type")]
    pub link_type: String,
    pub strength: f32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub semantic: bool,
}

impl GraphLink {
    /// Whether this link connects the two rules, in either direction
    pub fn connects(&self, a: &RuleId, b: &RuleId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }
}

/// The final graph handed to renderers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizationData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}
