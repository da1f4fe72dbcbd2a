use anyhow::Result;

use feedpost_core::storage::{ArticleRepository, Database, SourceRepository};

pub async fn run(db: &Database) -> Result<()> {
    let source_repo = SourceRepository::new(db);
    let sources = source_repo.list_all().await?;

    if sources.is_empty() {
        println!("No sources yet.");
        println!("\nTo register a feed, run:");
        println!("  feedpost add --name <name> --url <url>");
        return Ok(());
    }

    println!("Sources ({}):\n", sources.len());

    for source in &sources {
        println!("  [{}] {} (priority {})", source.id, source.name, source.priority);
        println!("    URL: {}", source.feed_url);
        println!("    Added: {}", source.created_at.format("%Y-%m-%d %H:%M"));
        println!();
    }

    let pending = ArticleRepository::new(db).count_not_posted().await?;
    println!("{} articles waiting to be posted", pending);

    Ok(())
}
