//! Rule inventory: directory scan and metadata extraction
//!
//! Walks a directory for rule files, parses the optional front-matter block,
//! and derives purpose, dependencies, usage patterns, and type heuristics.
//! Per-file problems (unreadable file, malformed front matter) are logged
//! and skipped; only an unusable directory fails the scan.

use super::types::{compute_hash, RuleDocument, RuleId, RuleType, UsageKind, UsagePattern};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions treated as rule documents
const RULE_EXTENSIONS: &[&str] = &["mdc", "md"];

/// Errors that can fail an inventory scan outright
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scans directories of rule documents
#[derive(Debug, Clone, Default)]
pub struct RuleInventory;

impl RuleInventory {
    pub fn new() -> Self {
        Self
    }

    /// Scan a directory (recursively) for rule documents
    ///
    /// The returned ids are paths relative to `directory`, with `/`
    /// separators regardless of platform.
    pub fn scan(&self, directory: &Path) -> Result<Vec<RuleDocument>, InventoryError> {
        if !directory.is_dir() {
            return Err(InventoryError::NotADirectory(
                directory.to_string_lossy().to_string(),
            ));
        }

        let mut rules = Vec::new();
        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_rule_file(entry.path()) {
                continue;
            }

            let content = match std::fs::read_to_string(entry.path()) {
                Ok(c) => c,
                Err(e) => {
                    warn!("skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let id = entry
                .path()
                .strip_prefix(directory)
                .map(RuleId::from_path)
                .unwrap_or_else(|_| RuleId::from_path(entry.path()));

            match build_document(id, content) {
                Some(doc) => rules.push(doc),
                None => warn!(
                    "skipping {}: malformed front matter",
                    entry.path().display()
                ),
            }
        }

        debug!("scanned {} rule documents", rules.len());
        Ok(rules)
    }
}

/// Check whether a path carries a rule extension
fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RULE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Build a document from raw content; None means the front matter was
/// present but unparseable and the file should be skipped.
fn build_document(id: RuleId, content: String) -> Option<RuleDocument> {
    let front_matter = match parse_front_matter(&content) {
        FrontMatter::None => None,
        FrontMatter::Parsed(v) => Some(v),
        FrontMatter::Malformed => return None,
    };

    let body = strip_front_matter(&content);
    let purpose = extract_purpose(body);
    let dependencies = extract_dependencies(&front_matter, body);
    let usage_patterns = analyze_usage_patterns(&content);
    let tags = extract_tags(&front_matter);

    let current_type = front_matter
        .as_ref()
        .and_then(|fm| fm.get("type"))
        .and_then(|v| v.as_str())
        .map(RuleType::parse)
        .unwrap_or_else(|| type_from_path(&id));
    let suggested_type = suggest_type(&content);

    let content_hash = compute_hash(&content);
    Some(RuleDocument {
        id,
        content,
        current_type,
        suggested_type,
        purpose,
        dependencies,
        usage_patterns,
        tags,
        content_hash,
    })
}

enum FrontMatter {
    None,
    Parsed(Value),
    Malformed,
}

/// Parse the optional `---`-delimited front-matter block.
///
/// Accepts `key: value` pairs and inline `tags: [a, b]` lists; parsed via
/// YAML and normalized to JSON values.
fn parse_front_matter(content: &str) -> FrontMatter {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return FrontMatter::None;
    }

    let after_first = &trimmed[3..];
    let Some(end_pos) = after_first.find("\n---") else {
        return FrontMatter::None;
    };
    let block = &after_first[..end_pos];

    match serde_yaml::from_str::<serde_yaml::Value>(block) {
        Ok(yaml) => match serde_json::to_value(yaml) {
            Ok(json @ Value::Object(_)) => FrontMatter::Parsed(json),
            Ok(Value::Null) => FrontMatter::None,
            Ok(_) | Err(_) => FrontMatter::Malformed,
        },
        Err(_) => FrontMatter::Malformed,
    }
}

/// Content with the front-matter block removed
fn strip_front_matter(content: &str) -> &str {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return content;
    }
    let after_first = &trimmed[3..];
    match after_first.find("\n---") {
        Some(end_pos) => {
            let rest = &after_first[end_pos + 4..];
            rest.strip_prefix('\n').unwrap_or(rest)
        }
        None => content,
    }
}

/// First `#` heading, else the first paragraph, else a fixed fallback
fn extract_purpose(body: &str) -> String {
    for line in body.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix('#') {
            let text = heading.trim_start_matches('#').trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    for paragraph in body.split("\n\n") {
        let first_line = paragraph.lines().next().unwrap_or("").trim();
        if !first_line.is_empty() && !first_line.starts_with('#') {
            return first_line.to_string();
        }
    }

    "No purpose description found".to_string()
}

/// Front-matter `dependencies:` list, inline `depends on:` declarations,
/// and bare `*.mdc` filename references, deduped in document order.
fn extract_dependencies(front_matter: &Option<Value>, body: &str) -> Vec<RuleId> {
    let mut deps: Vec<RuleId> = Vec::new();
    let mut push = |id: RuleId| {
        if !deps.contains(&id) {
            deps.push(id);
        }
    };

    if let Some(Value::Array(items)) = front_matter.as_ref().and_then(|fm| fm.get("dependencies"))
    {
        for item in items {
            if let Value::String(s) = item {
                push(RuleId::from_string(s.trim()));
            }
        }
    }

    for line in body.lines() {
        let lower = line.to_lowercase();
        let Some(pos) = lower.find("depends on:").map(|p| p + 11).or_else(|| {
            lower
                .find("depends:")
                .map(|p| p + 8)
                .filter(|_| !lower.contains("depends on"))
        }) else {
            continue;
        };
        for dep in line[pos..].split(',') {
            let dep = dep.trim();
            if !dep.is_empty() {
                push(RuleId::from_string(dep));
            }
        }
    }

    for reference in mdc_references(body) {
        push(RuleId::from_string(reference));
    }

    deps
}

/// Bare `name.mdc` tokens appearing in the body
fn mdc_references(body: &str) -> Vec<String> {
    let mut refs = Vec::new();
    for token in body.split(|c: char| c.is_whitespace() || "()[]`\"',;:".contains(c)) {
        let clean = token.trim_end_matches('.');
        if clean.len() > 4
            && clean.to_lowercase().ends_with(".mdc")
            && !refs.contains(&clean.to_string())
        {
            refs.push(clean.to_string());
        }
    }
    refs
}

/// Front-matter tags, lowercased
fn extract_tags(front_matter: &Option<Value>) -> Vec<String> {
    let mut tags = Vec::new();
    let Some(tag_val) = front_matter.as_ref().and_then(|fm| fm.get("tags")) else {
        return tags;
    };

    match tag_val {
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    tags.push(s.to_lowercase());
                }
            }
        }
        Value::String(s) => {
            for tag in s.split(',') {
                let t = tag.trim().to_lowercase();
                if !t.is_empty() {
                    tags.push(t);
                }
            }
        }
        _ => {}
    }
    tags
}

/// Usage patterns the content reveals
fn analyze_usage_patterns(content: &str) -> Vec<UsagePattern> {
    let mut patterns = Vec::new();
    let lower = content.to_lowercase();

    if lower.contains("alwaysapply: true") {
        patterns.push(UsagePattern {
            kind: UsageKind::Direct,
            location: "global".to_string(),
        });
    }
    if lower.contains("referenced by") || lower.contains("used by") {
        patterns.push(UsagePattern {
            kind: UsageKind::Referenced,
            location: "external".to_string(),
        });
    }
    if lower.contains("import") || lower.contains("include") {
        patterns.push(UsagePattern {
            kind: UsageKind::Imported,
            location: "internal".to_string(),
        });
    }

    patterns
}

/// Path-segment type heuristic, used when front matter declares no type
fn type_from_path(id: &RuleId) -> RuleType {
    let path = id.as_str();
    if path.contains("memory/") {
        RuleType::AgentRequested
    } else if path.contains("core/") {
        RuleType::AutoApplied
    } else if path.contains("conditional/") {
        RuleType::Conditional
    } else {
        RuleType::Manual
    }
}

/// Content heuristic for the type a rule probably wants
fn suggest_type(content: &str) -> RuleType {
    let lower = content.to_lowercase();

    if lower.contains("alwaysapply: true") || lower.contains("always apply") {
        RuleType::AutoApplied
    } else if lower.contains("when ") && (lower.contains("apply") || lower.contains("trigger")) {
        RuleType::Conditional
    } else if lower.contains("memory") || lower.contains("context") {
        RuleType::AgentRequested
    } else {
        RuleType::Manual
    }
}
