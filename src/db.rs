use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

/// Byte-level key/value storage the predictions are kept in.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

pub struct StoreStats {
    pub keys: usize,
    pub last_write: Option<String>,
}

pub fn connect(path: &str) -> Result<SqliteStore> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store = SqliteStore { conn };
    store.init_schema()?;
    Ok(store)
}

impl SqliteStore {
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let store = SqliteStore { conn: Connection::open_in_memory()? };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      BLOB NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let (keys, last_write): (i64, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), MAX(updated_at) FROM kv",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(StoreStats {
            keys: keys as usize,
            last_write,
        })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        map: HashMap<String, Vec<u8>>,
    }

    impl KvStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.map.get(key).cloned())
        }

        fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
            self.map.insert(key.to_string(), value.to_vec());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_is_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get("latest").unwrap(), None);
    }

    #[test]
    fn put_overwrites() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.put("latest", b"one").unwrap();
        store.put("latest", b"two").unwrap();
        assert_eq!(store.get("latest").unwrap().as_deref(), Some(&b"two"[..]));

        let stats = store.stats().unwrap();
        assert_eq!(stats.keys, 1);
        assert!(stats.last_write.is_some());
    }
}
