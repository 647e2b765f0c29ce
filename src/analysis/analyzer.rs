//! Content analyzer
//!
//! Turns raw rule content into a deterministic feature summary: ranked
//! keywords, key phrases, themes, a structural classification, named
//! entities, a hashed bag-of-features embedding, and a relevance score.
//! Analysis is pure CPU work and never fails; empty content analyzes to
//! the empty result.

use super::types::{
    AnalysisResult, AnalyzerConfig, ContentClass, Entity, EntityKind, EMBEDDING_DIMENSIONS,
};
use crate::rules::RuleDocument;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::collections::{HashMap, HashSet};

/// Stop-words dropped from keyword candidates
const STOPWORDS: &[&str] = &[
    "about", "after", "all", "and", "any", "are", "because", "been", "being", "below", "between",
    "both", "but", "can", "could", "did", "does", "doing", "during", "each", "for", "from", "had",
    "has", "have", "having", "its", "just", "may", "might", "must", "not", "other", "our", "out",
    "shall", "should", "some", "such", "than", "that", "the", "their", "them", "then", "these",
    "they", "this", "those", "through", "under", "use", "was", "were", "what", "when", "where",
    "which", "while", "will", "with", "within", "without", "would", "you", "your",
];

/// Controlled theme vocabulary: theme name and its indicator terms
const THEME_VOCABULARY: &[(&str, &[&str])] = &[
    (
        "development",
        &["code", "development", "programming", "software", "engineering", "implementation"],
    ),
    (
        "design",
        &["design", "interface", "layout", "visual", "style", "aesthetic"],
    ),
    (
        "testing",
        &["test", "testing", "validation", "verification", "quality", "assurance"],
    ),
    (
        "documentation",
        &["document", "documentation", "comment", "explanation", "description", "guide"],
    ),
    (
        "architecture",
        &["architecture", "structure", "system", "component", "module", "pattern"],
    ),
    (
        "data",
        &["data", "database", "storage", "model", "schema", "entity"],
    ),
    (
        "security",
        &["security", "authentication", "authorization", "permission", "access"],
    ),
    (
        "performance",
        &["performance", "optimization", "efficiency", "speed", "latency", "throughput"],
    ),
];

/// Whether a theme label comes from the controlled vocabulary (as opposed
/// to a document heading)
pub(crate) fn is_vocabulary_theme(label: &str) -> bool {
    THEME_VOCABULARY
        .iter()
        .any(|(theme, _)| label.eq_ignore_ascii_case(theme))
}

/// Structural features pulled from one markdown parse
#[derive(Debug, Default)]
struct MarkdownScan {
    headings: Vec<String>,
    code_fences: usize,
    links: usize,
    list_items: usize,
}

/// Deterministic content analyzer
#[derive(Debug, Clone, Default)]
pub struct ContentAnalyzer {
    config: AnalyzerConfig,
}

impl ContentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze raw content with no document metadata
    pub fn analyze(&self, content: &str) -> AnalysisResult {
        self.analyze_with_metadata(content, None, &[], 0)
    }

    /// Analyze a rule document, letting its id extension, tags, and usage
    /// patterns inform classification and relevance
    pub fn analyze_document(&self, doc: &RuleDocument) -> AnalysisResult {
        let extension = doc
            .id
            .file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase());
        self.analyze_with_metadata(
            &doc.content,
            extension.as_deref(),
            &doc.tags,
            doc.usage_patterns.len(),
        )
    }

    fn analyze_with_metadata(
        &self,
        content: &str,
        extension: Option<&str>,
        tags: &[String],
        usage_count: usize,
    ) -> AnalysisResult {
        if content.trim().is_empty() {
            return AnalysisResult::empty();
        }

        let scan = scan_markdown(content);
        let tokens = tokenize(content, self.config.min_word_length);
        let frequencies = self.rank_tokens(&tokens, &scan.headings, tags);

        let keywords = top_keywords(&frequencies, self.config.max_keywords);
        let keyword_set: HashSet<&str> = keywords.iter().map(|k| k.as_str()).collect();
        let key_phrases = extract_key_phrases(&tokens, &keyword_set, self.config.max_key_phrases);
        let themes = detect_themes(&scan.headings, &keywords, &key_phrases);
        let classification = classify(content, &scan, extension);
        let entities = extract_entities(content);
        let embedding = build_embedding(&frequencies, &keywords, &key_phrases);
        let relevance_score = relevance(
            content,
            &keywords,
            &themes,
            &scan,
            &entities,
            usage_count,
            self.config.max_keywords,
        );

        AnalysisResult {
            keywords,
            key_phrases,
            themes,
            classification,
            entities,
            embedding,
            relevance_score,
        }
    }

    /// Frequency map with heading and tag boosts applied
    fn rank_tokens(
        &self,
        tokens: &[String],
        headings: &[String],
        tags: &[String],
    ) -> HashMap<String, f32> {
        let extra: HashSet<&str> = self
            .config
            .extra_stopwords
            .iter()
            .map(|s| s.as_str())
            .collect();

        let mut frequencies: HashMap<String, f32> = HashMap::new();
        for token in tokens {
            if STOPWORDS.contains(&token.as_str()) || extra.contains(token.as_str()) {
                continue;
            }
            *frequencies.entry(token.clone()).or_insert(0.0) += 1.0;
        }

        for heading in headings {
            for token in tokenize(heading, self.config.min_word_length) {
                if let Some(count) = frequencies.get_mut(&token) {
                    *count += 2.0;
                }
            }
        }
        for tag in tags {
            for token in tokenize(tag, self.config.min_word_length) {
                *frequencies.entry(token).or_insert(0.0) += 3.0;
            }
        }

        frequencies
    }
}

/// Lowercase alphanumeric tokens of at least `min_length` characters,
/// in document order
fn tokenize(content: &str, min_length: usize) -> Vec<String> {
    content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= min_length)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Top-K tokens by boosted frequency; ties break lexicographically so
/// repeated analysis is stable
fn top_keywords(frequencies: &HashMap<String, f32>, max_keywords: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, f32)> = frequencies.iter().map(|(t, c)| (t, *c)).collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(t, _)| t.clone())
        .collect()
}

/// Sliding 2–4 token windows that contain at least one keyword, deduped
/// in document order
fn extract_key_phrases(
    tokens: &[String],
    keywords: &HashSet<&str>,
    max_phrases: usize,
) -> Vec<String> {
    let content_tokens: Vec<&String> = tokens
        .iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect();

    let mut phrases = Vec::new();
    let mut seen = HashSet::new();
    for width in 2..=4usize {
        for window in content_tokens.windows(width) {
            if !window.iter().any(|t| keywords.contains(t.as_str())) {
                continue;
            }
            let phrase = window
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if seen.insert(phrase.clone()) {
                phrases.push(phrase);
                if phrases.len() >= max_phrases {
                    return phrases;
                }
            }
        }
    }
    phrases
}

/// Heading-derived labels in document order, then controlled-vocabulary
/// themes matched against keywords and phrases
fn detect_themes(headings: &[String], keywords: &[String], key_phrases: &[String]) -> Vec<String> {
    let mut themes: Vec<String> = Vec::new();
    for heading in headings {
        let label = heading.trim();
        if !label.is_empty() && !themes.iter().any(|t| t.eq_ignore_ascii_case(label)) {
            themes.push(label.to_string());
        }
    }

    let mut scored: Vec<(&str, usize)> = Vec::new();
    for (theme, terms) in THEME_VOCABULARY {
        let score = terms
            .iter()
            .filter(|term| {
                keywords.iter().any(|k| k == *term)
                    || key_phrases.iter().any(|p| p.split(' ').any(|w| w == **term))
            })
            .count();
        if score > 0 {
            scored.push((theme, score));
        }
    }
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (theme, _) in scored {
        if !themes.iter().any(|t| t.eq_ignore_ascii_case(theme)) {
            themes.push(theme.to_string());
        }
    }

    themes
}

/// One pass over the markdown event stream collecting structural features
fn scan_markdown(content: &str) -> MarkdownScan {
    let mut scan = MarkdownScan::default();
    let mut in_heading = false;
    let mut heading_text = String::new();

    for event in Parser::new_ext(content, Options::all()) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                in_heading = true;
                heading_text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                in_heading = false;
                let text = heading_text.trim().to_string();
                if !text.is_empty() {
                    scan.headings.push(text);
                }
            }
            Event::Start(Tag::CodeBlock(_)) => scan.code_fences += 1,
            Event::Start(Tag::Link { .. }) => scan.links += 1,
            Event::Start(Tag::Item) => scan.list_items += 1,
            Event::Text(text) => {
                if in_heading {
                    heading_text.push_str(&text);
                }
            }
            Event::Code(code) => {
                if in_heading {
                    heading_text.push_str(&code);
                }
            }
            _ => {}
        }
    }

    scan
}

/// Classify content from structural cues, letting an unambiguous file
/// extension override the heuristics
fn classify(content: &str, scan: &MarkdownScan, extension: Option<&str>) -> ContentClass {
    match extension {
        Some("rs" | "py" | "js" | "ts" | "jsx" | "tsx" | "java" | "go" | "rb" | "c" | "cpp") => {
            return ContentClass::Code
        }
        Some("md" | "mdx" | "markdown") => return ContentClass::Markdown,
        Some("json" | "yaml" | "yml" | "toml" | "ini" | "cfg") => return ContentClass::Config,
        Some("txt") => return ContentClass::Text,
        _ => {}
    }

    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return ContentClass::Text;
    }

    let code_lines = lines
        .iter()
        .filter(|l| {
            let t = l.trim_start();
            t.starts_with("fn ")
                || t.starts_with("def ")
                || t.starts_with("class ")
                || t.starts_with("function ")
                || t.starts_with("import ")
                || t.starts_with("use ")
                || t.starts_with("const ")
                || t.starts_with("let ")
                || t.ends_with('{')
                || t.ends_with(';')
        })
        .count();
    let config_lines = lines
        .iter()
        .filter(|l| {
            let t = l.trim();
            !t.starts_with('#')
                && !t.starts_with("- ")
                && (looks_like_assignment(t, ':') || looks_like_assignment(t, '='))
        })
        .count();
    let markdown_score = scan.headings.len() * 2 + scan.links + scan.list_items + scan.code_fences;

    let code_ratio = code_lines as f32 / lines.len() as f32;
    let config_ratio = config_lines as f32 / lines.len() as f32;

    if code_ratio > 0.4 && code_lines >= 3 {
        ContentClass::Code
    } else if config_ratio > 0.6 && config_lines >= 3 {
        ContentClass::Config
    } else if markdown_score >= 2 {
        ContentClass::Markdown
    } else {
        ContentClass::Text
    }
}

/// `key: value` / `key = value` with a single-word key
fn looks_like_assignment(line: &str, sep: char) -> bool {
    match line.split_once(sep) {
        Some((key, value)) => {
            let key = key.trim();
            !key.is_empty()
                && !value.trim().is_empty()
                && key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        }
        None => false,
    }
}

/// Declaration scan plus capitalized multi-word sequences
fn extract_entities(content: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut seen: HashSet<(String, EntityKind)> = HashSet::new();
    let mut push = |name: String, kind: EntityKind, entities: &mut Vec<Entity>| {
        if seen.insert((name.clone(), kind)) {
            entities.push(Entity { name, kind });
        }
    };

    for line in content.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        for pair in words.windows(2) {
            let name = clean_identifier(pair[1]);
            if name.is_empty() {
                continue;
            }
            match pair[0] {
                "class" | "struct" | "interface" | "trait" => {
                    push(name, EntityKind::Class, &mut entities)
                }
                "fn" | "function" | "def" => push(name, EntityKind::Function, &mut entities),
                _ => {}
            }
        }

        // Capitalized runs of two or more words read as concept names
        let mut run: Vec<&str> = Vec::new();
        for word in words.iter().chain(std::iter::once(&"")) {
            let clean = word.trim_matches(|c: char| c.is_ascii_punctuation());
            if is_capitalized_word(clean) {
                run.push(clean);
            } else {
                if run.len() >= 2 {
                    push(run.join(" "), EntityKind::Concept, &mut entities);
                }
                run.clear();
            }
        }

        // Short ALL-CAPS tokens are acronyms
        for word in &words {
            let clean = word.trim_matches(|c: char| c.is_ascii_punctuation());
            if (2..=8).contains(&clean.len())
                && clean.chars().all(|c| c.is_ascii_uppercase())
            {
                push(clean.to_string(), EntityKind::Other, &mut entities);
            }
        }
    }

    entities
}

/// Strip call parens, generics, and trailing punctuation from a declaration name
fn clean_identifier(word: &str) -> String {
    word.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| c.is_lowercase() || c.is_numeric()),
        _ => false,
    }
}

/// Weight of one key phrase relative to a single keyword occurrence.
/// Phrases repeat their constituent keywords, so full weight would let
/// near-orthogonal phrase sets swamp the shared-keyword signal.
const PHRASE_WEIGHT: f32 = 0.5;

/// Hash keywords (weighted by boosted frequency) and key phrases into a
/// fixed-length L2-normalized vector
fn build_embedding(
    frequencies: &HashMap<String, f32>,
    keywords: &[String],
    key_phrases: &[String],
) -> Vec<f32> {
    let mut embedding = vec![0.0f32; EMBEDDING_DIMENSIONS];
    for keyword in keywords {
        let weight = frequencies.get(keyword).copied().unwrap_or(1.0);
        embedding[bucket_of(keyword)] += weight;
    }
    for phrase in key_phrases {
        embedding[bucket_of(phrase)] += PHRASE_WEIGHT;
    }

    let magnitude = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in &mut embedding {
            *value /= magnitude;
        }
    }
    embedding
}

fn bucket_of(feature: &str) -> usize {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    feature.hash(&mut hasher);
    (hasher.finish() % EMBEDDING_DIMENSIONS as u64) as usize
}

/// Blend of keyword density, theme coherence, structure, length, and
/// usage signal, clamped to [0, 1]
fn relevance(
    content: &str,
    keywords: &[String],
    themes: &[String],
    scan: &MarkdownScan,
    entities: &[Entity],
    usage_count: usize,
    max_keywords: usize,
) -> f32 {
    let mut score = 0.0f32;

    score += 0.3 * (keywords.len() as f32 / max_keywords.max(1) as f32);

    match themes.len() {
        0 => {}
        1..=3 => score += 0.15,
        _ => score += 0.05,
    }

    let length = content.len();
    if length > 1000 {
        score += 0.2;
    } else if length > 500 {
        score += 0.1;
    }

    if !scan.headings.is_empty() {
        score += 0.1;
    }
    if !entities.is_empty() {
        score += 0.1;
    }

    score += (usage_count as f32 * 0.05).min(0.15);

    score.clamp(0.0, 1.0)
}
