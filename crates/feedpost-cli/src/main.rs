use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feedpost_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "feedpost")]
#[command(author, version, about = "Manage feed sources and the article delivery queue")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a feed source
    Add {
        /// Display name for the source
        #[arg(short = 'n', long)]
        name: String,
        /// Feed URL
        #[arg(short = 'u', long)]
        url: String,
        /// Higher priorities are posted first among equally fresh articles
        #[arg(short = 'p', long, default_value_t = 1)]
        priority: i64,
    },
    /// List registered sources
    List,
    /// Show a stored article
    Show { id: i64 },
    /// Change a source's priority
    SetPriority { id: i64, priority: i64 },
    /// Remove a source and all of its articles
    Delete { id: i64 },
    /// Preview the next delivery batch
    Pending {
        /// Only articles published within this many hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
        /// Maximum number of articles
        #[arg(short = 'l', long, default_value_t = 10)]
        limit: u32,
    },
    /// Record an article as posted
    MarkPosted {
        id: i64,
        /// Fail unless the article was still pending
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::debug!("Loaded configuration from {}", AppConfig::config_path().display());
    let db = Database::new(&config).await?;

    let result = match cli.command {
        Commands::Add { name, url, priority } => {
            commands::add::run(&db, &name, &url, priority).await
        }
        Commands::List => commands::list::run(&db).await,
        Commands::Show { id } => commands::show::run(&db, id).await,
        Commands::SetPriority { id, priority } => {
            commands::set_priority::run(&db, id, priority).await
        }
        Commands::Delete { id } => commands::delete::run(&db, id).await,
        Commands::Pending { hours, limit } => commands::pending::run(&db, hours, limit).await,
        Commands::MarkPosted { id, strict } => {
            commands::mark_posted::run(&db, id, strict).await
        }
    };

    db.close().await;
    result
}
