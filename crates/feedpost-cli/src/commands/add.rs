use anyhow::{Context, Result};
use url::Url;

use feedpost_core::{
    feed::NewSource,
    storage::{Database, SourceRepository},
};

pub async fn run(db: &Database, name: &str, url: &str, priority: i64) -> Result<()> {
    let feed_url = Url::parse(url).with_context(|| format!("Invalid feed URL: {}", url))?;

    let source_repo = SourceRepository::new(db);
    let new_source = NewSource::new(name, feed_url.as_str()).with_priority(priority);
    let id = source_repo.add(&new_source).await?;

    println!("Added source: {} ({})", name, id);
    println!("  URL: {}", feed_url);
    println!("  Priority: {}", priority);

    Ok(())
}
