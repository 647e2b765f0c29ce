//! Rule document types
//!
//! A rule document is a text file of guidance consumed by an AI coding
//! assistant. Documents are immutable snapshots per scan; the one mutation
//! is an explicit type update.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unique identifier for a rule document
///
/// Serializes as a plain string (the rule's path-like id, e.g.
/// "rules/core/architecture.mdc")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Create a RuleId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a RuleId from a filesystem path
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().replace('\\', "/"))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment (used as a display label)
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The parent directory portion, or "root" when there is none
    pub fn directory(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "root",
        }
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a rule is applied by the assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Applied only when the user invokes it
    Manual,
    /// Pulled in by the agent when it judges the rule relevant
    AgentRequested,
    /// Applied to every session
    AutoApplied,
    /// Applied when a declared condition matches
    Conditional,
}

impl RuleType {
    /// Parse a type string, tolerating `-`/`_` variants; unknown values
    /// fall back to `Manual`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "agent_requested" => Self::AgentRequested,
            "auto_applied" => Self::AutoApplied,
            "conditional" => Self::Conditional,
            _ => Self::Manual,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Manual => "manual",
            Self::AgentRequested => "agent_requested",
            Self::AutoApplied => "auto_applied",
            Self::Conditional => "conditional",
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a rule is consumed, as far as its content reveals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// Applied directly (e.g. `alwaysApply: true`)
    Direct,
    /// Referenced by another document
    Referenced,
    /// Imported/included into another document
    Imported,
}

/// An observed usage pattern for a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePattern {
    pub kind: UsageKind,
    /// Where the usage applies ("global", "external", "internal")
    pub location: String,
}

/// A rule document: the unit of analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Path-like identifier, unique within a corpus
    pub id: RuleId,
    /// Raw file content, front matter included
    pub content: String,
    /// Type currently in effect
    pub current_type: RuleType,
    /// Type the content heuristics suggest
    pub suggested_type: RuleType,
    /// One-line purpose, taken from the first heading or paragraph
    pub purpose: String,
    /// Declared dependency ids (front matter + inline declarations)
    pub dependencies: Vec<RuleId>,
    /// Usage patterns observed in the content
    pub usage_patterns: Vec<UsagePattern>,
    /// Front-matter tags, lowercased
    pub tags: Vec<String>,
    /// Content hash for analysis-cache invalidation
    pub content_hash: String,
}

impl RuleDocument {
    /// Create a document with derived fields left empty
    ///
    /// Used by tests and by callers that construct rules without a
    /// filesystem scan; `RuleInventory` builds fully-populated documents.
    pub fn new(id: impl Into<RuleId>, content: impl Into<String>) -> Self {
        let content = content.into();
        let content_hash = compute_hash(&content);
        Self {
            id: id.into(),
            content,
            current_type: RuleType::Manual,
            suggested_type: RuleType::Manual,
            purpose: String::new(),
            dependencies: Vec::new(),
            usage_patterns: Vec::new(),
            tags: Vec::new(),
            content_hash,
        }
    }

    /// Set the effective type
    pub fn with_type(mut self, rule_type: RuleType) -> Self {
        self.current_type = rule_type;
        self
    }

    /// Add a declared dependency
    pub fn with_dependency(mut self, dep: impl Into<RuleId>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Explicitly update the effective type
    pub fn set_current_type(&mut self, rule_type: RuleType) {
        self.current_type = rule_type;
    }
}

/// Compute the 16-hex-digit content hash used for cache invalidation
pub fn compute_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
