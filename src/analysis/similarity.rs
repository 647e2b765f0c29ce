//! Similarity scoring between analyzed documents
//!
//! Blends keyword-set overlap, theme-set overlap, and embedding cosine
//! similarity into a single score in [0, 1]. Component weights are
//! renormalized over the components present on at least one side, so a
//! corpus without themes is compared on keywords and embeddings alone.

use super::analyzer::ContentAnalyzer;
use super::types::AnalysisResult;
use std::collections::HashSet;

/// Relative weights for the similarity blend
#[derive(Debug, Clone, Copy)]
pub struct SimilarityWeights {
    pub keywords: f32,
    pub themes: f32,
    pub embedding: f32,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            keywords: 0.4,
            themes: 0.2,
            embedding: 0.4,
        }
    }
}

/// Compares documents via their analyzed features
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine {
    analyzer: ContentAnalyzer,
    weights: SimilarityWeights,
}

impl SimilarityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Score two raw texts
    ///
    /// Identical non-empty content scores 1.0; either side empty scores 0.0.
    pub fn calculate_similarity(&self, content_a: &str, content_b: &str) -> f32 {
        if content_a.trim().is_empty() || content_b.trim().is_empty() {
            return 0.0;
        }
        if content_a == content_b {
            return 1.0;
        }
        self.score(
            &self.analyzer.analyze(content_a),
            &self.analyzer.analyze(content_b),
        )
    }

    /// Score two already-analyzed documents
    pub fn score(&self, a: &AnalysisResult, b: &AnalysisResult) -> f32 {
        let mut total_weight = 0.0f32;
        let mut total = 0.0f32;

        if !a.keywords.is_empty() || !b.keywords.is_empty() {
            total += self.weights.keywords * jaccard(&a.keywords, &b.keywords);
            total_weight += self.weights.keywords;
        }

        // Heading-derived labels are document titles, not shared vocabulary;
        // only controlled-vocabulary themes are comparable across documents.
        let themes_a = vocabulary_themes(&a.themes);
        let themes_b = vocabulary_themes(&b.themes);
        if !themes_a.is_empty() || !themes_b.is_empty() {
            total += self.weights.themes * jaccard(&themes_a, &themes_b);
            total_weight += self.weights.themes;
        }
        let cos = cosine(&a.embedding, &b.embedding);
        if cos.is_some() || !a.keywords.is_empty() || !b.keywords.is_empty() {
            total += self.weights.embedding * cos.unwrap_or(0.0);
            total_weight += self.weights.embedding;
        }

        if total_weight == 0.0 {
            return 0.0;
        }
        (total / total_weight).clamp(0.0, 1.0)
    }
}

fn vocabulary_themes(themes: &[String]) -> Vec<String> {
    themes
        .iter()
        .filter(|t| super::analyzer::is_vocabulary_theme(t))
        .cloned()
        .collect()
}

/// Case-insensitive Jaccard overlap of two label sets
fn jaccard(a: &[String], b: &[String]) -> f32 {
    let set_a: HashSet<String> = a.iter().map(|s| s.to_lowercase()).collect();
    let set_b: HashSet<String> = b.iter().map(|s| s.to_lowercase()).collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

/// Cosine similarity; None when either vector has zero magnitude
fn cosine(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return None;
    }
    Some((dot / (mag_a * mag_b)).clamp(0.0, 1.0))
}
