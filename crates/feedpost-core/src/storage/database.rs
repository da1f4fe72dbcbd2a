use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use crate::config::AppConfig;
use crate::Result;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open the configured database file and ensure the schema exists
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let db_path = config.database_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}", db_path.display());

        tracing::info!("Connecting to database: {}", db_path.display());

        // Set per connection so every pooled handle enforces the cascade.
        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.setup_schema().await;

        Ok(db)
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // A single connection that never recycles, otherwise the data goes with it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.setup_schema().await;

        Ok(db)
    }

    /// Create tables and indexes if they are missing.
    ///
    /// Failures are logged rather than returned: a broken schema shows up as
    /// an error on the first real query instead of aborting startup.
    async fn setup_schema(&self) {
        tracing::debug!("Ensuring database schema");

        for (name, statement) in SCHEMA {
            if let Err(e) = sqlx::query(statement).execute(&self.pool).await {
                tracing::error!(step = name, error = %e, "Failed to set up schema");
            }
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const SCHEMA: [(&str, &str); 5] = [
    ("sources", CREATE_SOURCES),
    ("articles", CREATE_ARTICLES),
    ("idx_articles_pending", CREATE_IDX_PENDING),
    ("idx_articles_created_at", CREATE_IDX_CREATED_AT),
    ("idx_articles_source_id", CREATE_IDX_SOURCE_ID),
];

const CREATE_SOURCES: &str = r#"
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    feed_url TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 1,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

const CREATE_ARTICLES: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    link TEXT NOT NULL UNIQUE,
    summary TEXT,
    published_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    posted_at DATETIME
)
"#;

const CREATE_IDX_PENDING: &str =
    "CREATE INDEX IF NOT EXISTS idx_articles_pending ON articles(posted_at, published_at)";

const CREATE_IDX_CREATED_AT: &str =
    "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at DESC)";

const CREATE_IDX_SOURCE_ID: &str =
    "CREATE INDEX IF NOT EXISTS idx_articles_source_id ON articles(source_id)";
