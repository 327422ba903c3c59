//! SQLite-backed settings file
//!
//! Table `settings(key, value, value_type, updated_at)`; values are stored
//! as text next to their kind tag.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{SettingKind, SettingValue, SettingsStore, SettingsTransaction},
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Executor, Row, Sqlite, Transaction,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Name of the settings file when the host does not choose one
pub const DEFAULT_SETTINGS_NAME: &str = "default_settings";

/// How long an in-memory store waits for its single connection
pub const IN_MEMORY_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        value_type TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

const UPSERT: &str = r#"
    INSERT INTO settings (key, value, value_type, updated_at)
    VALUES (?, ?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        value_type = excluded.value_type,
        updated_at = excluded.updated_at
"#;

/// SQLite-backed settings store implementation
///
/// One named file per store, one row per key. Each value row carries its
/// type tag, so reads with the wrong type are reported as
/// [`BridgeError::TypeMismatch`].
pub struct SqliteSettingsStore {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl SqliteSettingsStore {
    /// Open (or create) the settings file `<dir>/<name>.db`
    pub async fn open(dir: &Path, name: &str) -> Result<Self> {
        Self::new(dir.join(format!("{}.db", name))).await
    }

    /// Create a new settings store with the given database path
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // WAL lets readers see the last committed state while a
        // transaction is open on another connection
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(db_error("open settings database"))?;

        Self::create_table(&pool).await?;

        debug!(path = ?db_path, "Initialized settings store");

        Ok(Self {
            pool,
            path: Some(db_path),
        })
    }

    /// Create an in-memory settings store (for testing)
    ///
    /// Limited to one connection that is never recycled, since the database
    /// lives only as long as it does. While a transaction is open that
    /// connection is taken, so other calls fail with
    /// [`BridgeError::DatabaseError`] after [`IN_MEMORY_ACQUIRE_TIMEOUT`].
    /// Use [`open`](Self::open) when reads must overlap a transaction.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(IN_MEMORY_ACQUIRE_TIMEOUT)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(db_error("open settings database"))?;

        Self::create_table(&pool).await?;

        Ok(Self { pool, path: None })
    }

    /// Location of the backing file; `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn create_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(pool)
            .await
            .map_err(db_error("create table"))?;
        Ok(())
    }

}

fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> BridgeError {
    move |e| BridgeError::DatabaseError(format!("Failed to {}: {}", action, e))
}

async fn upsert<'e, E>(executor: E, key: &str, value: &SettingValue) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(UPSERT)
        .bind(key)
        .bind(value.encode())
        .bind(value.kind().as_str())
        .bind(chrono::Utc::now().timestamp())
        .execute(executor)
        .await
        .map_err(db_error("set setting"))?;
    Ok(())
}

async fn delete_key<'e, E>(executor: E, key: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(executor)
        .await
        .map_err(db_error("delete setting"))?;
    Ok(())
}

async fn delete_all<'e, E>(executor: E) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM settings")
        .execute(executor)
        .await
        .map_err(db_error("clear settings"))?;
    Ok(())
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        upsert(&self.pool, key, &value).await?;
        debug!(key = key, value_type = %value.kind(), "Stored setting");
        Ok(())
    }

    async fn get(&self, key: &str, kind: SettingKind) -> Result<Option<SettingValue>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get setting"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row.get(0);
        let value_type: String = row.get(1);

        if value_type != kind.as_str() {
            warn!(key = key, expected = %kind, actual = %value_type, "Type mismatch");
            return Err(BridgeError::TypeMismatch {
                key: key.to_string(),
                expected: kind.to_string(),
                actual: value_type,
            });
        }

        SettingValue::decode(key, kind, &value).map(Some)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        delete_key(&self.pool, key).await?;
        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("check key"))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list keys"))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        delete_all(&self.pool).await?;
        debug!("Cleared all settings");
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<Box<dyn SettingsTransaction + Send>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;

        Ok(Box::new(SqliteSettingsTransaction { tx: Some(tx) }))
    }
}

/// Pending batch of setting writes.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
struct SqliteSettingsTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteSettingsTransaction {
    fn active(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        self.tx.as_mut().ok_or_else(finished)
    }

    fn finish(&mut self) -> Result<Transaction<'static, Sqlite>> {
        self.tx.take().ok_or_else(finished)
    }
}

fn finished() -> BridgeError {
    BridgeError::OperationFailed("Transaction already finished".to_string())
}

#[async_trait]
impl SettingsTransaction for SqliteSettingsTransaction {
    async fn set(&mut self, key: &str, value: SettingValue) -> Result<()> {
        upsert(&mut **self.active()?, key, &value).await
    }

    async fn delete(&mut self, key: &str) -> Result<()> {
        delete_key(&mut **self.active()?, key).await
    }

    async fn clear_all(&mut self) -> Result<()> {
        delete_all(&mut **self.active()?).await
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish()?.commit().await.map_err(db_error("commit"))?;
        debug!("Committed settings transaction");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish()?
            .rollback()
            .await
            .map_err(db_error("roll back"))?;
        debug!("Rolled back settings transaction");
        Ok(())
    }
}
