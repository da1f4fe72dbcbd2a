use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{saturating_count, Database};
use crate::feed::{NewSource, Source};
use crate::{Error, Result};

/// Registry of feed sources
pub struct SourceRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    feed_url: String,
    priority: i64,
    created_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            feed_url: row.feed_url,
            priority: row.priority,
            created_at: row.created_at,
        }
    }
}

impl<'a> SourceRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a new source, returning its id
    pub async fn add(&self, new_source: &NewSource) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sources (name, feed_url, priority, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new_source.name)
        .bind(&new_source.feed_url)
        .bind(new_source.priority)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(source_id = id, name = %new_source.name, "Added source");

        Ok(id)
    }

    /// All sources. Callers must not rely on the order.
    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, priority, created_at
            FROM sources
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    /// Find a source by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row: Option<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, priority, created_at
            FROM sources
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }

    /// Like [`find_by_id`](Self::find_by_id), but a missing row is an error
    pub async fn get(&self, id: i64) -> Result<Source> {
        self.find_by_id(id)
            .await?
            .ok_or(Error::SourceNotFound(id))
    }

    /// Change the priority of an existing source.
    ///
    /// Unlike [`delete`](Self::delete), targeting an unknown id is reported as
    /// [`Error::SourceNotFound`] so a typo in management tooling is not lost.
    pub async fn set_priority(&self, id: i64, priority: i64) -> Result<()> {
        let result = sqlx::query("UPDATE sources SET priority = ? WHERE id = ?")
            .bind(priority)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::SourceNotFound(id));
        }

        tracing::info!(source_id = id, priority, "Updated source priority");
        Ok(())
    }

    /// Delete a source and all its articles.
    /// Returns false if there was nothing to delete.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(source_id = id, "Deleted source");
        }

        Ok(deleted)
    }

    /// Get total source count
    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sources")
            .fetch_one(self.db.pool())
            .await?;

        Ok(saturating_count(count.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_lookup() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let before = Utc::now();
        let id = repo
            .add(&NewSource::new("Rust Blog", "https://blog.rust-lang.org/feed.xml").with_priority(5))
            .await
            .unwrap();

        let source = repo.get(id).await.unwrap();
        assert_eq!(source.id, id);
        assert_eq!(source.name, "Rust Blog");
        assert_eq!(source.feed_url, "https://blog.rust-lang.org/feed.xml");
        assert_eq!(source.priority, 5);
        assert!(source.created_at >= before);
    }

    #[tokio::test]
    async fn test_default_priority() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let id = repo.add(&NewSource::new("a", "https://a.example/rss")).await.unwrap();
        assert_eq!(repo.get(id).await.unwrap().priority, 1);
    }

    #[tokio::test]
    async fn test_list_all() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        assert!(repo.list_all().await.unwrap().is_empty());

        repo.add(&NewSource::new("a", "https://a.example/rss")).await.unwrap();
        repo.add(&NewSource::new("b", "https://b.example/rss")).await.unwrap();

        let mut names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        assert!(repo.find_by_id(42).await.unwrap().is_none());
        let err = repo.get(42).await.unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(42)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_priority() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let id = repo.add(&NewSource::new("a", "https://a.example/rss")).await.unwrap();
        repo.set_priority(id, 10).await.unwrap();
        assert_eq!(repo.get(id).await.unwrap().priority, 10);
    }

    #[tokio::test]
    async fn test_set_priority_unknown_id_is_not_found() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let err = repo.set_priority(99, 3).await.unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(99)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SourceRepository::new(&db);

        let id = repo.add(&NewSource::new("a", "https://a.example/rss")).await.unwrap();
        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
        assert!(!repo.delete(12345).await.unwrap());
        assert!(repo.find_by_id(id).await.unwrap().is_none());
    }
}
