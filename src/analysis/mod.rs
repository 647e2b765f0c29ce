//! Content analysis pipeline
//!
//! Deterministic feature extraction (`ContentAnalyzer`), similarity scoring
//! (`SimilarityEngine`), and the hash-revalidated result cache
//! (`AnalysisCache`).

mod analyzer;
mod cache;
mod similarity;
mod types;

pub use analyzer::ContentAnalyzer;
pub use cache::AnalysisCache;
pub use similarity::{SimilarityEngine, SimilarityWeights};
pub use types::{
    AnalysisResult, AnalyzerConfig, ContentClass, Entity, EntityKind, EMBEDDING_DIMENSIONS,
};
