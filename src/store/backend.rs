//! Persistence trait for relationship records

use super::types::{Relationship, RelationshipType};
use crate::rules::RuleId;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Result type for persistence operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for relationship persistence backends
///
/// A backend holds one record per relationship, keyed by
/// (source, target, type). Writes must be atomic: a failed write leaves
/// the previously persisted set intact.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait RelationshipBackend: Send + Sync {
    /// Load every persisted relationship
    fn load_all(&self) -> StorageResult<Vec<Relationship>>;

    /// Insert or update one relationship record
    fn save(&self, relationship: &Relationship) -> StorageResult<()>;

    /// Delete records matching source and target; `relationship_type` of
    /// None deletes all types between the pair. Returns the deleted count.
    fn delete(
        &self,
        source: &RuleId,
        target: &RuleId,
        relationship_type: Option<RelationshipType>,
    ) -> StorageResult<usize>;

    /// Replace the whole persisted set in a single transaction
    fn replace_all(&self, relationships: &[Relationship]) -> StorageResult<()>;
}

/// Extension trait for opening backends from paths
pub trait OpenBackend: RelationshipBackend + Sized {
    /// Open or create a backend at the given path; a missing file starts
    /// an empty store, not an error
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory backend (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
