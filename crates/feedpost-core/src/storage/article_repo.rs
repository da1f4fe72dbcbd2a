use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{saturating_count, Database};
use crate::feed::{Article, NewArticle};
use crate::selection::{SelectionWindow, SELECT_PENDING};
use crate::{Error, Result};

/// Repository for article ingestion and delivery state
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    source_id: i64,
    title: String,
    link: String,
    summary: Option<String>,
    published_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    posted_at: Option<DateTime<Utc>>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            link: row.link,
            summary: row.summary,
            published_at: row.published_at,
            created_at: row.created_at,
            posted_at: row.posted_at,
        }
    }
}

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store a newly discovered article, deduplicated by link.
    ///
    /// A link that is already stored is left untouched and the call still
    /// succeeds; the return value tells whether a row was inserted. An unknown
    /// `source_id` is rejected as a foreign key [`Error::Constraint`].
    pub async fn store(&self, new_article: &NewArticle) -> Result<bool> {
        self.store_discovered_at(new_article, Utc::now()).await
    }

    pub(crate) async fn store_discovered_at(
        &self,
        new_article: &NewArticle,
        discovered_at: DateTime<Utc>,
    ) -> Result<bool> {
        if new_article.link.trim().is_empty() {
            return Err(Error::InvalidArticle(format!(
                "empty link for '{}'",
                new_article.title
            )));
        }

        let published_at = new_article.published_at.unwrap_or(discovered_at);

        // OR IGNORE covers the link uniqueness only; foreign keys still fail.
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
            (source_id, title, link, summary, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_article.source_id)
        .bind(&new_article.title)
        .bind(&new_article.link)
        .bind(&new_article.summary)
        .bind(published_at)
        .bind(discovered_at)
        .execute(self.db.pool())
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            tracing::debug!(link = %new_article.link, "Stored article");
        } else {
            tracing::trace!(link = %new_article.link, "Article already stored");
        }

        Ok(inserted)
    }

    pub async fn exists_by_link(&self, link: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM articles WHERE link = ?")
            .bind(link)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }

    /// Find an article by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary,
                   published_at, created_at, posted_at
            FROM articles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Unposted articles published at or after `since`, newest discovery
    /// first, then by source priority, at most `limit` of them
    pub async fn all_not_posted(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(SELECT_PENDING)
            .bind(since)
            .bind(i64::from(limit))
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    pub async fn select(&self, window: &SelectionWindow) -> Result<Vec<Article>> {
        self.all_not_posted(window.since, window.limit).await
    }

    /// Record delivery of an article.
    ///
    /// Does not look at the previous state: calling it again moves
    /// `posted_at` forward. Use [`mark_as_posted_if_pending`] when two
    /// deliverers may race for the same article.
    ///
    /// [`mark_as_posted_if_pending`]: Self::mark_as_posted_if_pending
    pub async fn mark_as_posted(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE articles SET posted_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Record delivery only if nobody has yet.
    /// Fails with [`Error::NotPending`] if the article is already posted or gone.
    pub async fn mark_as_posted_if_pending(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET posted_at = ?
            WHERE id = ? AND posted_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotPending(id));
        }

        Ok(())
    }

    /// Number of articles not yet delivered, regardless of age
    pub async fn count_not_posted(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE posted_at IS NULL")
            .fetch_one(self.db.pool())
            .await?;

        Ok(saturating_count(count.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintKind;
    use crate::feed::{ArticleState, NewSource};
    use crate::storage::SourceRepository;
    use chrono::Duration;

    async fn setup() -> Database {
        Database::new_in_memory().await.unwrap()
    }

    async fn add_source(db: &Database, name: &str, priority: i64) -> i64 {
        SourceRepository::new(db)
            .add(&NewSource::new(name, format!("https://{name}.example/rss")).with_priority(priority))
            .await
            .unwrap()
    }

    fn new_article(source_id: i64, link: &str, published_at: DateTime<Utc>) -> NewArticle {
        NewArticle {
            source_id,
            title: format!("Title of {link}"),
            link: link.to_string(),
            summary: Some("A summary.".to_string()),
            published_at: Some(published_at),
        }
    }

    async fn count_rows(db: &Database) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(db.pool())
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_store_assigns_created_at() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let before = Utc::now();
        assert!(repo.store(&new_article(source, "https://a.example/1", before)).await.unwrap());

        let stored = repo.all_not_posted(before - Duration::hours(1), 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].created_at >= before);
        assert_eq!(stored[0].state(), ArticleState::Discovered);
        assert_eq!(stored[0].summary.as_deref(), Some("A summary."));
    }

    #[tokio::test]
    async fn test_store_duplicate_link_is_noop() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let published = Utc::now() - Duration::hours(2);
        let original = new_article(source, "https://a.example/dup", published);
        assert!(repo.store(&original).await.unwrap());

        let mut again = new_article(source, "https://a.example/dup", Utc::now());
        again.title = "Changed title".to_string();
        again.summary = Some("Changed summary.".to_string());
        assert!(!repo.store(&again).await.unwrap());

        assert_eq!(count_rows(&db).await, 1);
        let stored = repo.all_not_posted(published - Duration::hours(1), 10).await.unwrap();
        assert_eq!(stored[0].title, original.title);
        assert_eq!(stored[0].summary, original.summary);
        assert_eq!(stored[0].published_at, published);
        assert!(repo.exists_by_link("https://a.example/dup").await.unwrap());
    }

    #[tokio::test]
    async fn test_link_unique_across_sources() {
        let db = setup().await;
        let first = add_source(&db, "first", 1).await;
        let second = add_source(&db, "second", 10).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        assert!(repo.store(&new_article(first, "https://shared.example/x", now)).await.unwrap());
        assert!(!repo.store(&new_article(second, "https://shared.example/x", now)).await.unwrap());

        let stored = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source_id, first);
    }

    #[tokio::test]
    async fn test_store_unknown_source_fails() {
        let db = setup().await;
        let repo = ArticleRepository::new(&db);

        let err = repo
            .store(&new_article(999, "https://nowhere.example/1", Utc::now()))
            .await
            .unwrap_err();

        assert!(err.is_constraint());
        assert!(matches!(
            err,
            Error::Constraint { kind: ConstraintKind::ForeignKey, .. }
        ));
        assert_eq!(count_rows(&db).await, 0);
    }

    #[tokio::test]
    async fn test_store_empty_link_rejected() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let err = repo.store(&new_article(source, "  ", Utc::now())).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArticle(_)));
        assert_eq!(count_rows(&db).await, 0);
    }

    #[tokio::test]
    async fn test_missing_published_at_defaults_to_discovery_time() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let mut article = new_article(source, "https://a.example/undated", Utc::now());
        article.published_at = None;
        let discovered = Utc::now() - Duration::minutes(5);
        repo.store_discovered_at(&article, discovered).await.unwrap();

        let stored = repo.all_not_posted(discovered, 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].published_at, discovered);
        assert_eq!(stored[0].created_at, discovered);
    }

    #[tokio::test]
    async fn test_recency_filter() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        repo.store(&new_article(source, "https://a.example/2d", now - Duration::days(2))).await.unwrap();
        repo.store(&new_article(source, "https://a.example/12h", now - Duration::hours(12))).await.unwrap();
        repo.store(&new_article(source, "https://a.example/1h", now - Duration::hours(1))).await.unwrap();

        let day: Vec<String> = repo
            .all_not_posted(now - Duration::hours(24), 10)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.link)
            .collect();
        assert_eq!(day.len(), 2);
        assert!(day.contains(&"https://a.example/12h".to_string()));
        assert!(day.contains(&"https://a.example/1h".to_string()));

        let recent = repo.all_not_posted(now - Duration::hours(6), 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].link, "https://a.example/1h");
    }

    #[tokio::test]
    async fn test_since_is_inclusive() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let boundary = Utc::now() - Duration::hours(3);
        repo.store(&new_article(source, "https://a.example/edge", boundary)).await.unwrap();

        assert_eq!(repo.all_not_posted(boundary, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unbounded_window_selects_old_articles() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let old = Utc::now() - Duration::days(365 * 30);
        repo.store(&new_article(source, "https://a.example/old", old)).await.unwrap();

        let window = SelectionWindow::trailing(Utc::now(), Duration::MAX, 10);
        let selected = repo.select(&window).await.unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].link, "https://a.example/old");
    }

    #[tokio::test]
    async fn test_priority_breaks_created_at_ties() {
        let db = setup().await;
        let low = add_source(&db, "low", 5).await;
        let high = add_source(&db, "high", 10).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        let discovered = now - Duration::minutes(1);
        repo.store_discovered_at(&new_article(low, "https://low.example/1", now), discovered)
            .await
            .unwrap();
        repo.store_discovered_at(&new_article(high, "https://high.example/1", now), discovered)
            .await
            .unwrap();

        let batch = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].source_id, high);
        assert_eq!(batch[1].source_id, low);
    }

    #[tokio::test]
    async fn test_created_at_outranks_priority() {
        let db = setup().await;
        let low = add_source(&db, "low", 1).await;
        let high = add_source(&db, "high", 100).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        repo.store_discovered_at(&new_article(high, "https://high.example/old", now), now - Duration::minutes(10))
            .await
            .unwrap();
        repo.store_discovered_at(&new_article(low, "https://low.example/new", now), now - Duration::minutes(1))
            .await
            .unwrap();

        let batch = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert_eq!(batch[0].link, "https://low.example/new");
        assert_eq!(batch[1].link, "https://high.example/old");
    }

    #[tokio::test]
    async fn test_limit_keeps_newest_discoveries() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        for i in 0..5 {
            let link = format!("https://a.example/{i}");
            repo.store_discovered_at(&new_article(source, &link, now), now - Duration::minutes(10 - i))
                .await
                .unwrap();
        }

        let window = SelectionWindow::new(now - Duration::hours(1), 2);
        let batch = repo.select(&window).await.unwrap();
        let links: Vec<&str> = batch.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["https://a.example/4", "https://a.example/3"]);
    }

    #[tokio::test]
    async fn test_empty_selection_is_ok() {
        let db = setup().await;
        let repo = ArticleRepository::new(&db);

        assert!(repo.all_not_posted(Utc::now(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_as_posted_removes_from_selection() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        repo.store(&new_article(source, "https://a.example/1", now)).await.unwrap();
        repo.store(&new_article(source, "https://a.example/2", now)).await.unwrap();

        let since = now - Duration::hours(1);
        let batch = repo.all_not_posted(since, 10).await.unwrap();
        let posted = batch.iter().find(|a| a.link == "https://a.example/1").unwrap();
        repo.mark_as_posted(posted.id).await.unwrap();

        let remaining = repo.all_not_posted(since, 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].link, "https://a.example/2");

        let delivered = repo.find_by_id(posted.id).await.unwrap().unwrap();
        assert_eq!(delivered.state(), ArticleState::Delivered);
        assert_eq!(repo.count_not_posted().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_as_posted_twice_advances_timestamp() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        repo.store(&new_article(source, "https://a.example/1", Utc::now())).await.unwrap();
        let id = repo.all_not_posted(Utc::now() - Duration::hours(1), 1).await.unwrap()[0].id;

        repo.mark_as_posted(id).await.unwrap();
        let first = repo.find_by_id(id).await.unwrap().unwrap().posted_at.unwrap();
        repo.mark_as_posted(id).await.unwrap();
        let second = repo.find_by_id(id).await.unwrap().unwrap().posted_at.unwrap();

        assert!(second >= first);
    }

    #[tokio::test]
    async fn test_mark_as_posted_if_pending() {
        let db = setup().await;
        let source = add_source(&db, "a", 1).await;
        let repo = ArticleRepository::new(&db);

        repo.store(&new_article(source, "https://a.example/1", Utc::now())).await.unwrap();
        let id = repo.all_not_posted(Utc::now() - Duration::hours(1), 1).await.unwrap()[0].id;

        repo.mark_as_posted_if_pending(id).await.unwrap();
        let first = repo.find_by_id(id).await.unwrap().unwrap().posted_at;

        let err = repo.mark_as_posted_if_pending(id).await.unwrap_err();
        assert!(matches!(err, Error::NotPending(n) if n == id));
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().posted_at, first);

        assert!(matches!(
            repo.mark_as_posted_if_pending(4242).await.unwrap_err(),
            Error::NotPending(4242)
        ));
    }

    #[tokio::test]
    async fn test_deleting_source_cascades() {
        let db = setup().await;
        let doomed = add_source(&db, "doomed", 1).await;
        let kept = add_source(&db, "kept", 1).await;
        let repo = ArticleRepository::new(&db);

        let now = Utc::now();
        repo.store(&new_article(doomed, "https://doomed.example/1", now)).await.unwrap();
        repo.store(&new_article(doomed, "https://doomed.example/2", now)).await.unwrap();
        repo.store(&new_article(kept, "https://kept.example/1", now)).await.unwrap();

        assert!(SourceRepository::new(&db).delete(doomed).await.unwrap());

        let batch = repo.all_not_posted(now - Duration::hours(1), 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].source_id, kept);
        assert!(!repo.exists_by_link("https://doomed.example/1").await.unwrap());
        assert_eq!(count_rows(&db).await, 1);
    }
}
