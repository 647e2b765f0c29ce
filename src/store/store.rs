//! The relationship store
//!
//! Owns the keyed set of declared and inferred relationships plus the
//! source/target adjacency indices. The indices are private and only
//! mutated by the store's own operations, so they cannot drift from the
//! relationship set.

use super::backend::{RelationshipBackend, StorageError};
use super::types::{Relationship, RelationshipKey, RelationshipType, ValidationError};
use crate::rules::RuleId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The in-memory state was applied but could not be persisted; the
    /// store remains usable.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Store of relationships between rule documents
///
/// Constructed with an explicit persistence backend and passed by handle
/// into every operation that needs it; there is no ambient store.
pub struct RelationshipStore {
    backend: Arc<dyn RelationshipBackend>,
    relationships: BTreeMap<RelationshipKey, Relationship>,
    outgoing: HashMap<RuleId, Vec<RelationshipKey>>,
    incoming: HashMap<RuleId, Vec<RelationshipKey>>,
}

impl RelationshipStore {
    /// Create a store over a backend; call `initialize` to load persisted
    /// relationships
    pub fn new(backend: Arc<dyn RelationshipBackend>) -> Self {
        Self {
            backend,
            relationships: BTreeMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }

    /// Load persisted relationships and rebuild the adjacency indices
    ///
    /// An empty or freshly created backend is an empty store, not an error.
    /// Invalid persisted records are dropped with a log line rather than
    /// failing the load.
    pub fn initialize(&mut self) -> Result<(), StoreError> {
        let loaded = self.backend.load_all()?;
        self.relationships.clear();
        self.outgoing.clear();
        self.incoming.clear();

        for rel in loaded {
            if let Err(e) = rel.validate() {
                tracing::warn!("dropping invalid persisted relationship: {}", e);
                continue;
            }
            self.index(rel);
        }
        debug!("initialized with {} relationships", self.relationships.len());
        Ok(())
    }

    /// Add a relationship, persist it, and index it
    ///
    /// Rejects invalid records and exact duplicates synchronously. A
    /// persistence failure is returned after the in-memory state has been
    /// applied; the store degrades to "not saved" rather than crashing.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<(), StoreError> {
        relationship.validate()?;
        let key = relationship.key();
        if self.relationships.contains_key(&key) {
            return Err(ValidationError::Duplicate(key.to_string()).into());
        }

        self.index(relationship.clone());
        self.backend.save(&relationship)?;
        Ok(())
    }

    /// Remove relationships between two rules; `relationship_type` of None
    /// removes every type between the pair. Removing nothing is a no-op Ok.
    pub fn remove_relationship(
        &mut self,
        source: &RuleId,
        target: &RuleId,
        relationship_type: Option<RelationshipType>,
    ) -> Result<usize, StoreError> {
        let keys: Vec<RelationshipKey> = self
            .relationships
            .keys()
            .filter(|k| {
                &k.source == source
                    && &k.target == target
                    && relationship_type.map_or(true, |t| k.relationship_type == t)
            })
            .cloned()
            .collect();

        for key in &keys {
            self.unindex(key);
        }
        if !keys.is_empty() {
            self.backend.delete(source, target, relationship_type)?;
        }
        Ok(keys.len())
    }

    /// Every relationship touching a rule, in either direction
    pub fn get_related_rules(&self, rule_id: &RuleId) -> Vec<&Relationship> {
        let mut related: Vec<&Relationship> = self
            .get_outgoing_relationships(rule_id)
            .into_iter()
            .chain(self.get_incoming_relationships(rule_id))
            .collect();
        related.dedup_by(|a, b| a.key() == b.key());
        related
    }

    /// Relationships where the rule is the target
    pub fn get_incoming_relationships(&self, rule_id: &RuleId) -> Vec<&Relationship> {
        self.incoming
            .get(rule_id)
            .map(|keys| keys.iter().filter_map(|k| self.relationships.get(k)).collect())
            .unwrap_or_default()
    }

    /// Relationships where the rule is the source
    pub fn get_outgoing_relationships(&self, rule_id: &RuleId) -> Vec<&Relationship> {
        self.outgoing
            .get(rule_id)
            .map(|keys| keys.iter().filter_map(|k| self.relationships.get(k)).collect())
            .unwrap_or_default()
    }

    /// Snapshot of every relationship, ordered by key
    pub fn relationships(&self) -> Vec<Relationship> {
        self.relationships.values().cloned().collect()
    }

    /// Number of relationships held
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Persist the current in-memory set wholesale
    ///
    /// Used after bulk edits (e.g. merging accepted discovery results via
    /// repeated `add_relationship` is already persisted; this rewrites the
    /// backend to match memory exactly).
    pub fn save(&self) -> Result<(), StoreError> {
        let all: Vec<Relationship> = self.relationships.values().cloned().collect();
        self.backend.replace_all(&all)?;
        Ok(())
    }

    fn index(&mut self, relationship: Relationship) {
        let key = relationship.key();
        self.outgoing
            .entry(relationship.source.clone())
            .or_default()
            .push(key.clone());
        self.incoming
            .entry(relationship.target.clone())
            .or_default()
            .push(key.clone());
        self.relationships.insert(key, relationship);
    }

    fn unindex(&mut self, key: &RelationshipKey) {
        if self.relationships.remove(key).is_none() {
            return;
        }
        if let Some(keys) = self.outgoing.get_mut(&key.source) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.outgoing.remove(&key.source);
            }
        }
        if let Some(keys) = self.incoming.get_mut(&key.target) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.incoming.remove(&key.target);
            }
        }
    }
}
