use anyhow::Result;

use feedpost_core::storage::{ArticleRepository, Database};

/// Record an article as posted. With `strict`, an article that was already
/// posted or never existed is an error instead of a no-op.
pub async fn run(db: &Database, id: i64, strict: bool) -> Result<()> {
    let article_repo = ArticleRepository::new(db);

    if strict {
        article_repo.mark_as_posted_if_pending(id).await?;
    } else {
        article_repo.mark_as_posted(id).await?;
    }

    println!("Article {} marked as posted", id);
    Ok(())
}
