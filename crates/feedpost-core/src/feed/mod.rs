mod models;

pub use models::{Article, ArticleState, Candidate, NewArticle, NewSource, Source};

use crate::Result;

/// Produces candidate articles for a source.
///
/// Fetching and parsing live outside this crate; the scheduler only needs
/// something that turns a [`Source`] into candidates.
#[async_trait::async_trait]
pub trait FeedCollector: Send + Sync {
    async fn collect(&self, source: &Source) -> Result<Vec<Candidate>>;
}

/// Hands an article to the downstream channel
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, article: &Article) -> Result<()>;
}
