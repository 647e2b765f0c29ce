//! Relationship store persistence scenarios
//!
//! Round-trips through the SQLite backend, validation rejection, and the
//! degrade-to-not-saved behavior of the in-memory state.

use rulegraph::{
    OpenBackend, Relationship, RelationshipStore, RelationshipType, RuleId, SqliteBackend,
    StoreError, ValidationError,
};
use std::sync::Arc;
use tempfile::TempDir;

fn rel(source: &str, target: &str, t: RelationshipType, strength: f32) -> Relationship {
    Relationship::new(source, target, t, strength)
}

fn open_store(path: &std::path::Path) -> RelationshipStore {
    let mut store = RelationshipStore::new(Arc::new(SqliteBackend::open(path).unwrap()));
    store.initialize().unwrap();
    store
}

// --- Scenario: load(save(store)) reconstructs the set regardless of order ---

#[test]
fn round_trip_is_insertion_order_independent() {
    let dir = TempDir::new().unwrap();
    let path_a = dir.path().join("a.db");
    let path_b = dir.path().join("b.db");

    let forward = vec![
        rel("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.8),
        rel("b.mdc", "c.mdc", RelationshipType::Extends, 0.6),
        rel("c.mdc", "a.mdc", RelationshipType::Complements, 0.5),
    ];

    {
        let mut store = open_store(&path_a);
        for r in forward.iter() {
            store.add_relationship(r.clone()).unwrap();
        }
    }
    {
        let mut store = open_store(&path_b);
        for r in forward.iter().rev() {
            store.add_relationship(r.clone()).unwrap();
        }
    }

    let from_a = open_store(&path_a).relationships();
    let from_b = open_store(&path_b).relationships();
    assert_eq!(from_a, from_b);
    assert_eq!(from_a.len(), 3);
}

// --- Scenario: a missing database file starts an empty store ---

#[test]
fn missing_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir.path().join("never-existed.db"));
    assert!(store.is_empty());
}

// --- Scenario: validation failures reject synchronously ---

#[test]
fn validation_rejects_before_persisting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rels.db");
    let mut store = open_store(&path);

    let self_loop = rel("a.mdc", "a.mdc", RelationshipType::DependsOn, 0.5);
    assert!(matches!(
        store.add_relationship(self_loop),
        Err(StoreError::Validation(ValidationError::SelfLoop(_)))
    ));

    let out_of_range = rel("a.mdc", "b.mdc", RelationshipType::DependsOn, -3.0);
    assert!(matches!(
        store.add_relationship(out_of_range),
        Err(StoreError::Validation(ValidationError::StrengthOutOfRange(_)))
    ));

    drop(store);
    assert!(open_store(&path).is_empty(), "nothing was persisted");
}

// --- Scenario: duplicates rejected, payload differences notwithstanding ---

#[test]
fn duplicate_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir.path().join("rels.db"));

    store
        .add_relationship(rel("a.mdc", "b.mdc", RelationshipType::Extends, 0.6))
        .unwrap();
    let dup = rel("a.mdc", "b.mdc", RelationshipType::Extends, 0.1)
        .with_description("same key, different payload");
    assert!(matches!(
        store.add_relationship(dup),
        Err(StoreError::Validation(ValidationError::Duplicate(_)))
    ));

    // A different type between the same pair is a different relationship
    store
        .add_relationship(rel("a.mdc", "b.mdc", RelationshipType::Complements, 0.4))
        .unwrap();
    assert_eq!(store.len(), 2);
}

// --- Scenario: removal persists and wildcard type removes every type ---

#[test]
fn removal_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rels.db");

    {
        let mut store = open_store(&path);
        store
            .add_relationship(rel("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.8))
            .unwrap();
        store
            .add_relationship(rel("a.mdc", "b.mdc", RelationshipType::Complements, 0.4))
            .unwrap();
        store
            .add_relationship(rel("b.mdc", "c.mdc", RelationshipType::Extends, 0.7))
            .unwrap();

        let removed = store
            .remove_relationship(&RuleId::from("a.mdc"), &RuleId::from("b.mdc"), None)
            .unwrap();
        assert_eq!(removed, 2);
    }

    let store = open_store(&path);
    assert_eq!(store.len(), 1);
    assert_eq!(store.relationships()[0].source.as_str(), "b.mdc");
}

// --- Scenario: adjacency queries reflect persisted state after reload ---

#[test]
fn adjacency_indices_rebuilt_on_initialize() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rels.db");

    {
        let mut store = open_store(&path);
        store
            .add_relationship(rel("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.8))
            .unwrap();
        store
            .add_relationship(rel("c.mdc", "b.mdc", RelationshipType::Complements, 0.5))
            .unwrap();
    }

    let store = open_store(&path);
    let b = RuleId::from("b.mdc");
    assert_eq!(store.get_incoming_relationships(&b).len(), 2);
    assert!(store.get_outgoing_relationships(&b).is_empty());
    assert_eq!(store.get_related_rules(&b).len(), 2);
}
