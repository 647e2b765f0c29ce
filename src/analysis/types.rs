//! Core types for the content analysis pipeline

use serde::{Deserialize, Serialize};

/// Number of buckets in the hashed feature embedding
pub const EMBEDDING_DIMENSIONS: usize = 64;

/// Coarse classification of a document's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    Code,
    Markdown,
    Config,
    Text,
}

impl ContentClass {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Config => "config",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ContentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a named entity found in content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Class,
    Function,
    Concept,
    Other,
}

/// A named entity extracted from content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
}

/// Result of analyzing one document's content
///
/// Cacheable per (rule id, content hash); identical content always yields
/// an identical result, embedding vector included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Ranked unique keywords, highest-scoring first
    pub keywords: Vec<String>,
    /// Multi-token phrases containing at least one keyword, document order
    pub key_phrases: Vec<String>,
    /// Heading-derived labels in document order, then vocabulary themes
    pub themes: Vec<String>,
    /// Structural classification
    pub classification: ContentClass,
    /// Named entities (declarations and capitalized concepts)
    pub entities: Vec<Entity>,
    /// L2-normalized hashed bag-of-features vector (all zero when empty)
    pub embedding: Vec<f32>,
    /// Relevance of the document within a rule corpus, in [0, 1]
    pub relevance_score: f32,
}

impl AnalysisResult {
    /// The empty result: what empty content analyzes to
    pub fn empty() -> Self {
        Self {
            keywords: Vec::new(),
            key_phrases: Vec::new(),
            themes: Vec::new(),
            classification: ContentClass::Text,
            entities: Vec::new(),
            embedding: vec![0.0; EMBEDDING_DIMENSIONS],
            relevance_score: 0.0,
        }
    }

    /// Keywords and key phrases combined, deduped, keywords first
    pub fn concepts(&self) -> Vec<String> {
        let mut concepts = self.keywords.clone();
        for phrase in &self.key_phrases {
            if !concepts.contains(phrase) {
                concepts.push(phrase.clone());
            }
        }
        concepts
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Tunable knobs for the analyzer
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Minimum token length for keyword candidates
    pub min_word_length: usize,
    /// Maximum keywords retained
    pub max_keywords: usize,
    /// Maximum key phrases retained
    pub max_key_phrases: usize,
    /// Stop-words added on top of the built-in list
    pub extra_stopwords: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_word_length: 3,
            max_keywords: 16,
            max_key_phrases: 20,
            extra_stopwords: Vec::new(),
        }
    }
}
