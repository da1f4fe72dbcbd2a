use anyhow::Result;

use feedpost_core::storage::{Database, SourceRepository};

pub async fn run(db: &Database, id: i64) -> Result<()> {
    let source_repo = SourceRepository::new(db);

    if source_repo.delete(id).await? {
        println!("Deleted source {} and its articles", id);
    } else {
        println!("Source {} not found.", id);
        let sources = source_repo.list_all().await?;
        if !sources.is_empty() {
            println!("\nAvailable sources:");
            for s in &sources {
                println!("  [{}] {}", s.id, s.name);
            }
        }
    }

    Ok(())
}
