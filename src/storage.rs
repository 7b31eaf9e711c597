use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::{path::Path, str::FromStr};
use tracing::{debug, info};

use crate::{error::Result, models::Message, Error};

/// Persistence of messages and their like counters.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Creates the `messages` table if it does not exist yet. Safe to call repeatedly.
    async fn initialize(&self) -> Result<()>;

    /// Every message, newest first. Rows sharing a timestamp are ordered by id, newest first.
    async fn list_all(&self) -> Result<Vec<Message>>;

    /// Inserts a message and returns the id assigned by the store.
    async fn insert(&self, nickname: &str, content: &str) -> Result<i64>;

    /// Adds one to the like counter. Returns [`Error::NotFound`] when no row has this id.
    async fn increment_like(&self, id: i64) -> Result<()>;

    async fn like_count(&self, id: i64) -> Result<i64>;

    async fn close(&self);
}

/// SQLite-backed [`MessageStore`] holding a single-connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (and creates if absent) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let store = Self::connect(options).await?;
        info!("Opened message store at {}", path.as_ref().display());
        Ok(store)
    }

    /// A private in-memory database, mostly useful in tests.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // the in-memory database lives exactly as long as its connection,
        // so the one connection is never recycled
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nickname TEXT NOT NULL,
                content TEXT NOT NULL,
                create_time DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                like_count INTEGER NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_create_time ON messages(create_time)",
        )
        .execute(&self.pool)
        .await?;

        debug!("messages table ready");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "
            SELECT id, nickname, content, create_time, like_count
            FROM messages
            ORDER BY create_time DESC, id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn insert(&self, nickname: &str, content: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO messages (nickname, content) VALUES (?1, ?2)")
            .bind(nickname)
            .bind(content)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn increment_like(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE messages SET like_count = like_count + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    async fn like_count(&self, id: i64) -> Result<i64> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT like_count FROM messages WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        count.ok_or(Error::NotFound(id))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
