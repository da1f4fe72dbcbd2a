use anyhow::Result;

use feedpost_core::storage::{Database, SourceRepository};

pub async fn run(db: &Database, id: i64, priority: i64) -> Result<()> {
    SourceRepository::new(db).set_priority(id, priority).await?;
    println!("Source {} priority set to {}", id, priority);
    Ok(())
}
