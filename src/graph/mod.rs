//! Graph construction: filtered nodes/links plus semantic enhancement

mod builder;
mod enhancer;
mod types;

pub use builder::GraphBuilder;
pub use enhancer::GraphEnhancer;
pub use types::{
    GraphLink, GraphNode, GraphOptions, GroupBy, NodeMetrics, VisualizationData,
    SEMANTIC_LINK_TYPE,
};
