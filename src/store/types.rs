//! Relationship types and validation

use crate::rules::RuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Typed relationship between two rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    DependsOn,
    Extends,
    Complements,
    ConflictsWith,
}

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::DependsOn => "depends-on",
            Self::Extends => "extends",
            Self::Complements => "complements",
            Self::ConflictsWith => "conflicts-with",
        }
    }

    /// Parse a type string; unknown values are an error, not a fallback;
    /// relationship records are validated, unlike display options.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "depends-on" => Ok(Self::DependsOn),
            "extends" => Ok(Self::Extends),
            "complements" => Ok(Self::Complements),
            "conflicts-with" => Ok(Self::ConflictsWith),
            other => Err(ValidationError::UnknownType(other.to_string())),
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validation failures for relationship records
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("source and target are the same rule: {0}")]
    SelfLoop(String),

    #[error("strength {0} is outside [0, 1]")]
    StrengthOutOfRange(f32),

    #[error("unknown relationship type: {0}")]
    UnknownType(String),

    #[error("relationship already exists: {0}")]
    Duplicate(String),
}

/// A typed, weighted, directed edge between two rule documents
///
/// The direction reads "source depends on / extends / complements target".
/// Identity is (source, target, type); strength and description are payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: RuleId,
    pub target: RuleId,
    pub relationship_type: RelationshipType,
    /// Weight in [0, 1]
    pub strength: f32,
    pub description: Option<String>,
    /// True when inferred purely from content similarity
    #[serde(default)]
    pub semantic: bool,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn new(
        source: impl Into<RuleId>,
        target: impl Into<RuleId>,
        relationship_type: RelationshipType,
        strength: f32,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship_type,
            strength,
            description: None,
            semantic: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn semantic(mut self) -> Self {
        self.semantic = true;
        self
    }

    /// The identity key: source + target + type
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            source: self.source.clone(),
            target: self.target.clone(),
            relationship_type: self.relationship_type,
        }
    }

    /// Check record invariants
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source == self.target {
            return Err(ValidationError::SelfLoop(self.source.to_string()));
        }
        if !(0.0..=1.0).contains(&self.strength) || self.strength.is_nan() {
            return Err(ValidationError::StrengthOutOfRange(self.strength));
        }
        Ok(())
    }
}

/// Identity of a relationship within the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub source: RuleId,
    pub target: RuleId,
    pub relationship_type: RelationshipType,
}

impl std::fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -[{}]-> {}",
            self.source, self.relationship_type, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_self_loop() {
        let rel = Relationship::new("a.mdc", "a.mdc", RelationshipType::DependsOn, 0.5);
        assert!(matches!(rel.validate(), Err(ValidationError::SelfLoop(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_strength() {
        let high = Relationship::new("a.mdc", "b.mdc", RelationshipType::Extends, 1.5);
        assert!(matches!(
            high.validate(),
            Err(ValidationError::StrengthOutOfRange(_))
        ));

        let low = Relationship::new("a.mdc", "b.mdc", RelationshipType::Extends, -0.1);
        assert!(low.validate().is_err());

        let ok = Relationship::new("a.mdc", "b.mdc", RelationshipType::Extends, 1.0);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn type_parse_round_trips() {
        for t in [
            RelationshipType::DependsOn,
            RelationshipType::Extends,
            RelationshipType::Complements,
            RelationshipType::ConflictsWith,
        ] {
            assert_eq!(RelationshipType::parse(t.as_str()).unwrap(), t);
        }
        assert!(RelationshipType::parse("friends-with").is_err());
    }

    #[test]
    fn key_identity_ignores_payload() {
        let a = Relationship::new("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.3)
            .with_description("first");
        let b = Relationship::new("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.9);
        assert_eq!(a.key(), b.key());
    }
}
