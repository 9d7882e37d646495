//! SQLite collection store
//!
//! Implements [`StorageBackend`] on top of a single `records` table.
//! The connection sits behind an async mutex; every trait call takes the lock
//! for one statement only, so separate calls may interleave freely.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::debug;

use super::backend::StorageBackend;
use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};
use crate::models::Record;

/// SQLite-backed collection store
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            debug!("Initializing schema at {:?}", path);
            init_schema(&conn)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record counts per collection, sorted by collection name
    pub async fn collection_counts(&self) -> StorageResult<Vec<(String, usize)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT collection, COUNT(*) FROM records GROUP BY collection ORDER BY collection",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get(0)?, count.max(0) as usize))
            })?
            .collect::<Result<Vec<(String, usize)>, _>>()?;
        Ok(counts)
    }
}

fn decode(collection: &str, id: &str, data: &str) -> StorageResult<Record> {
    serde_json::from_str(data).map_err(|e| StorageError::CorruptRecord {
        collection: collection.to_string(),
        id: id.to_string(),
        details: e.to_string(),
    })
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Record>> {
        let conn = self.conn.lock().await;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM records WHERE collection = ? AND id = ?",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|data| decode(collection, id, &data)).transpose()
    }

    async fn get_all(&self, collection: &str) -> StorageResult<Vec<Record>> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare("SELECT id, data FROM records WHERE collection = ? ORDER BY id")?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|(id, data)| decode(collection, id, data))
            .collect()
    }

    async fn put(&self, collection: &str, record: &Record) -> StorageResult<()> {
        let data = serde_json::to_string(record)?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO records (collection, id, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(collection, id) DO UPDATE SET
                data = excluded.data,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
            params![
                collection,
                record.id(),
                data,
                record.created_at(),
                record.updated_at()
            ],
        )?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM records WHERE collection = ? AND id = ?",
            params![collection, id],
        )?;
        Ok(removed > 0)
    }

    async fn count(&self, collection: &str) -> StorageResult<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn animal(id: &str, herd: &str) -> Record {
        Record::new(id)
            .with_field("name", format!("Animal {}", id))
            .with_field("herdId", herd)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let record = animal("a-1", "h-1");

        backend.put("animals", &record).await.unwrap();

        let loaded = backend.get("animals", "a-1").await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(backend.get("animals", "missing").await.unwrap().is_none());
        assert!(backend.get("herds", "a-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_idempotent_upsert() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        let mut record = animal("a-1", "h-1");
        backend.put("animals", &record).await.unwrap();
        backend.put("animals", &record).await.unwrap();

        record.set("name", "Renamed");
        backend.put("animals", &record).await.unwrap();

        assert_eq!(backend.count("animals").await.unwrap(), 1);
        let loaded = backend.get("animals", "a-1").await.unwrap().unwrap();
        assert_eq!(loaded.get("name"), Some(&json!("Renamed")));
    }

    #[tokio::test]
    async fn test_get_all_is_ordered_by_id() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        for id in ["c", "a", "b"] {
            backend.put("tasks", &Record::new(id)).await.unwrap();
        }

        let ids: Vec<String> = backend
            .get_all("tasks")
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(backend.get_all("hives").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_by_index() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.put("animals", &animal("a-1", "h-1")).await.unwrap();
        backend.put("animals", &animal("a-2", "h-2")).await.unwrap();
        backend.put("animals", &animal("a-3", "h-1")).await.unwrap();

        let herd = backend
            .get_all_by_index("animals", "herdId", &json!("h-1"))
            .await
            .unwrap();

        assert_eq!(herd.len(), 2);
        assert!(herd.iter().all(|r| r.get("herdId") == Some(&json!("h-1"))));
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.put("seeds", &Record::new("s-1")).await.unwrap();

        assert!(backend.delete("seeds", "s-1").await.unwrap());
        assert!(!backend.delete("seeds", "s-1").await.unwrap());
        assert_eq!(backend.count("seeds").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_collection_counts() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.put("hives", &Record::new("h-1")).await.unwrap();
        backend.put("hives", &Record::new("h-2")).await.unwrap();
        backend.put("budgets", &Record::new("b-1")).await.unwrap();

        let counts = backend.collection_counts().await.unwrap();
        assert_eq!(
            counts,
            vec![("budgets".to_string(), 1), ("hives".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        {
            let conn = backend.conn.lock().await;
            conn.execute(
                "INSERT INTO records (collection, id, data) VALUES ('tasks', 't-1', 'not json')",
                [],
            )
            .unwrap();
        }

        let err = backend.get("tasks", "t-1").await.unwrap_err();
        assert!(matches!(err, StorageError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn test_open_on_disk_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("homestead.db");

        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.put("hives", &Record::new("h-1")).await.unwrap();
        }

        let backend = SqliteBackend::open(&path).unwrap();
        assert_eq!(backend.count("hives").await.unwrap(), 1);
    }
}
