use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};

use feedpost_core::{
    storage::{ArticleRepository, Database},
    SelectionWindow,
};

fn pending_window(hours: i64, limit: u32) -> Result<SelectionWindow> {
    let span = Duration::try_hours(hours).ok_or_else(|| anyhow!("--hours out of range: {}", hours))?;
    Ok(SelectionWindow::trailing(Utc::now(), span, limit))
}

pub async fn run(db: &Database, hours: i64, limit: u32) -> Result<()> {
    let window = pending_window(hours, limit)?;
    let articles = ArticleRepository::new(db).select(&window).await?;

    if articles.is_empty() {
        println!("Nothing pending in the last {} hours.", hours);
        return Ok(());
    }

    println!("Next {} to post:\n", articles.len());
    for article in &articles {
        println!(
            "  [{}] {} ({})",
            article.id,
            article.title,
            article.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("    {}", article.link);
    }

    Ok(())
}
