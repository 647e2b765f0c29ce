//! Rulegraph: Relationship Graph Engine for Rule Documents
//!
//! Analyzes a corpus of rule documents (guidance files consumed by an AI
//! coding assistant), infers semantic relationships between them, merges
//! them with explicitly declared ones, and produces a weighted node/link
//! graph for visualization and downstream tooling.
//!
//! # Core Concepts
//!
//! - **Rules**: text documents scanned from a directory, with optional
//!   front matter
//! - **Relationships**: typed, weighted directed edges between rules,
//!   declared or discovered
//! - **Graph**: the filtered, semantically enhanced node/link output
//!   handed to renderers
//!
//! # Example
//!
//! ```
//! use rulegraph::{GraphBuilder, GraphOptions};
//!
//! let builder = GraphBuilder::new();
//! let data = builder.generate(&[], &[], &GraphOptions::default());
//! assert!(data.nodes.is_empty());
//! ```

pub mod analysis;
pub mod graph;
pub mod rules;
pub mod store;

pub use analysis::{
    AnalysisCache, AnalysisResult, AnalyzerConfig, ContentAnalyzer, ContentClass, Entity,
    EntityKind, SimilarityEngine, SimilarityWeights, EMBEDDING_DIMENSIONS,
};
pub use graph::{
    GraphBuilder, GraphEnhancer, GraphLink, GraphNode, GraphOptions, GroupBy, NodeMetrics,
    VisualizationData, SEMANTIC_LINK_TYPE,
};
pub use rules::{
    InventoryError, RuleDocument, RuleId, RuleInventory, RuleType, UsageKind, UsagePattern,
};
pub use store::{
    discover_among, CancellationToken, DiscoveryConfig, DiscoveryError, OpenBackend,
    Relationship, RelationshipBackend, RelationshipStore, RelationshipType, SqliteBackend,
    StorageError, StorageResult, StoreError, ValidationError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
