//! SQLite persistence backend for relationships

use super::backend::{OpenBackend, RelationshipBackend, StorageError, StorageResult};
use super::types::{Relationship, RelationshipType};
use crate::rules::RuleId;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed relationship store
///
/// One row per relationship, keyed by (source, target, relationship).
/// Thread-safe via an internal mutex on the connection; transactions make
/// every write atomic.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS relationships (
                source TEXT NOT NULL,
                target TEXT NOT NULL,
                relationship TEXT NOT NULL,
                strength REAL NOT NULL,
                description TEXT,
                semantic INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (source, target, relationship)
            );

            CREATE INDEX IF NOT EXISTS idx_relationships_source
                ON relationships(source);
            CREATE INDEX IF NOT EXISTS idx_relationships_target
                ON relationships(target);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn row_to_relationship(
        source: String,
        target: String,
        relationship: String,
        strength: f64,
        description: Option<String>,
        semantic: bool,
        created_at: String,
    ) -> StorageResult<Relationship> {
        let relationship_type = RelationshipType::parse(&relationship)
            .map_err(|e| StorageError::CorruptRecord(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StorageError::CorruptRecord(format!("bad timestamp: {}", e)))?
            .with_timezone(&Utc);
        Ok(Relationship {
            source: RuleId::from_string(source),
            target: RuleId::from_string(target),
            relationship_type,
            strength: strength as f32,
            description,
            semantic,
            created_at,
        })
    }

    fn insert(conn: &Connection, rel: &Relationship) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO relationships
                (source, target, relationship, strength, description, semantic, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (source, target, relationship) DO UPDATE SET
                strength = excluded.strength,
                description = excluded.description,
                semantic = excluded.semantic,
                created_at = excluded.created_at
            "#,
            params![
                rel.source.as_str(),
                rel.target.as_str(),
                rel.relationship_type.as_str(),
                rel.strength as f64,
                rel.description,
                rel.semantic,
                rel.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl RelationshipBackend for SqliteBackend {
    fn load_all(&self) -> StorageResult<Vec<Relationship>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source, target, relationship, strength, description, semantic, created_at
             FROM relationships ORDER BY source, target, relationship",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut relationships = Vec::new();
        for row in rows {
            let (source, target, relationship, strength, description, semantic, created_at) =
                row?;
            relationships.push(Self::row_to_relationship(
                source,
                target,
                relationship,
                strength,
                description,
                semantic,
                created_at,
            )?);
        }
        Ok(relationships)
    }

    fn save(&self, relationship: &Relationship) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        Self::insert(&conn, relationship)
    }

    fn delete(
        &self,
        source: &RuleId,
        target: &RuleId,
        relationship_type: Option<RelationshipType>,
    ) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = match relationship_type {
            Some(t) => conn.execute(
                "DELETE FROM relationships
                 WHERE source = ?1 AND target = ?2 AND relationship = ?3",
                params![source.as_str(), target.as_str(), t.as_str()],
            )?,
            None => conn.execute(
                "DELETE FROM relationships WHERE source = ?1 AND target = ?2",
                params![source.as_str(), target.as_str()],
            )?,
        };
        Ok(deleted)
    }

    fn replace_all(&self, relationships: &[Relationship]) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM relationships", [])?;
        for rel in relationships {
            Self::insert(&tx, rel)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl OpenBackend for SqliteBackend {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(source: &str, target: &str, t: RelationshipType, strength: f32) -> Relationship {
        Relationship::new(source, target, t, strength)
    }

    #[test]
    fn save_and_load_round_trip() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let rel = sample("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.8)
            .with_description("a references b");
        backend.save(&rel).unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].source.as_str(), "a.mdc");
        assert_eq!(loaded[0].relationship_type, RelationshipType::DependsOn);
        assert_eq!(loaded[0].description.as_deref(), Some("a references b"));
    }

    #[test]
    fn save_same_key_updates_in_place() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .save(&sample("a.mdc", "b.mdc", RelationshipType::Extends, 0.5))
            .unwrap();
        backend
            .save(&sample("a.mdc", "b.mdc", RelationshipType::Extends, 0.9))
            .unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!((loaded[0].strength - 0.9).abs() < 1e-6);
    }

    #[test]
    fn delete_with_type_wildcard() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .save(&sample("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.8))
            .unwrap();
        backend
            .save(&sample("a.mdc", "b.mdc", RelationshipType::Complements, 0.4))
            .unwrap();

        let deleted = backend
            .delete(&RuleId::from("a.mdc"), &RuleId::from("b.mdc"), None)
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(backend.load_all().unwrap().is_empty());
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("relationships.db");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend
                .save(&sample("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.7))
                .unwrap();
        }

        let backend = SqliteBackend::open(&path).unwrap();
        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].target.as_str(), "b.mdc");
    }

    #[test]
    fn replace_all_is_total() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .save(&sample("a.mdc", "b.mdc", RelationshipType::DependsOn, 0.7))
            .unwrap();

        backend
            .replace_all(&[
                sample("x.mdc", "y.mdc", RelationshipType::Extends, 0.9),
                sample("y.mdc", "z.mdc", RelationshipType::Complements, 0.6),
            ])
            .unwrap();

        let loaded = backend.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|r| r.source.as_str() != "a.mdc"));
    }
}
