use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValueStore;
use crate::domain::error::AppError;

/// SQLite ストレージ（key-value テーブル 1 つ）
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 新規接続（ファイルパス指定）
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| AppError::storage(format!("Failed to open database: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// in-memory DB（テスト用）
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::storage(format!("Failed to create in-memory database: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// 既定の DB パス: QZ_DB_PATH > <data_local_dir>/quizontal/quizontal.db
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("QZ_DB_PATH") {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizontal")
            .join("quizontal.db")
    }

    /// 親ディレクトリを作成してから開く
    pub fn open_default(path: &Path) -> Result<Self, AppError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::storage(format!("Failed to create {}: {e}", dir.display()))
                })?;
            }
        }
        Self::open(path)
    }

    /// スキーママイグレーション
    fn migrate(&self) -> Result<(), AppError> {
        self.conn
            .lock()
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS kv (
                    key        TEXT PRIMARY KEY,
                    value      TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                ",
            )
            .map_err(|e| AppError::storage(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.conn
            .lock()
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| AppError::storage(format!("Failed to read '{key}': {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .lock()
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(|e| AppError::storage(format!("Failed to write '{key}': {e}")))?;
        Ok(())
    }
}
