use anyhow::Result;

use feedpost_core::{
    storage::{ArticleRepository, Database, SourceRepository},
    Error,
};

pub async fn run(db: &Database, id: i64) -> Result<()> {
    let article = ArticleRepository::new(db)
        .find_by_id(id)
        .await?
        .ok_or(Error::ArticleNotFound(id))?;

    let source = SourceRepository::new(db).find_by_id(article.source_id).await?;
    let source_name = source.as_ref().map_or("(unknown)", |s| s.name.as_str());

    println!("{}", article.title);
    println!("  Link: {}", article.link);
    println!("  Source: {}", source_name);
    println!("  Published: {}", article.published_at.format("%Y-%m-%d %H:%M"));
    println!("  Discovered: {}", article.created_at.format("%Y-%m-%d %H:%M"));
    match article.posted_at {
        Some(posted) => println!("  Posted: {}", posted.format("%Y-%m-%d %H:%M")),
        None => println!("  Posted: not yet"),
    }

    if !article.summary_text().is_empty() {
        println!("\n{}", article.summary_text());
    }

    Ok(())
}
