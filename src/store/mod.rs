//! Relationship store: persistence, adjacency indices, and discovery

mod backend;
mod discovery;
mod sqlite;
mod store;
mod types;

pub use backend::{OpenBackend, RelationshipBackend, StorageError, StorageResult};
pub use discovery::{discover_among, CancellationToken, DiscoveryConfig, DiscoveryError};
pub use sqlite::SqliteBackend;
pub use store::{RelationshipStore, StoreError};
pub use types::{Relationship, RelationshipKey, RelationshipType, ValidationError};
