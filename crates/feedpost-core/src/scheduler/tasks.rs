use std::time::Duration;

use crate::ai::SummaryService;
use crate::cancel::Cancellation;
use crate::feed::{Candidate, FeedCollector, NewArticle, Publisher, Source};
use crate::selection::SelectionWindow;
use crate::storage::{ArticleRepository, Database, SourceRepository};
use crate::{Error, Result};

use super::retry::with_retry;

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Newly stored articles
    pub stored: u32,
    /// Candidates whose link was already known
    pub duplicates: u32,
    /// Stored without a summary because the summarizer failed or is off
    pub unsummarized: u32,
    /// Candidates dropped for having no link
    pub rejected: u32,
}

impl IngestReport {
    fn merge(&mut self, other: IngestReport) {
        self.stored += other.stored;
        self.duplicates += other.duplicates;
        self.unsummarized += other.unsummarized;
        self.rejected += other.rejected;
    }
}

/// Outcome of one delivery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub posted: u32,
    /// Publisher refused; the article stays pending
    pub failed: u32,
    /// Another deliverer recorded the article first
    pub skipped: u32,
}

/// Store the candidates found for one source.
///
/// Links already in the store are skipped before summarization so the
/// upstream model is only asked about new articles.
pub async fn ingest_candidates(
    db: &Database,
    summarizer: &SummaryService,
    source: &Source,
    candidates: Vec<Candidate>,
    cancel: &Cancellation,
) -> Result<IngestReport> {
    let article_repo = ArticleRepository::new(db);
    let mut report = IngestReport::default();

    for candidate in candidates {
        if candidate.link.trim().is_empty() {
            tracing::warn!(source = %source.name, title = %candidate.title, "Skipping candidate without link");
            report.rejected += 1;
            continue;
        }

        let known = cancel
            .run(with_retry("exists_by_link", || {
                article_repo.exists_by_link(&candidate.link)
            }))
            .await?;
        if known {
            report.duplicates += 1;
            continue;
        }

        let summary = summarizer
            .summarize_for_ingest(&candidate.link, &candidate.title, cancel)
            .await?;
        if summary.is_none() {
            report.unsummarized += 1;
        }

        let new_article = NewArticle::from_candidate(source.id, candidate, summary);
        let inserted = cancel
            .run(with_retry("store", || article_repo.store(&new_article)))
            .await?;

        if inserted {
            tracing::debug!(source = %source.name, title = %new_article.title, "Ingested article");
            report.stored += 1;
        } else {
            // Stored by a concurrent collector since the existence check
            report.duplicates += 1;
        }
    }

    Ok(report)
}

/// Poll every registered source and ingest what it yields.
///
/// A source that takes longer than `collect_timeout` is logged and skipped.
pub async fn collect_all_sources(
    db: &Database,
    collector: &dyn FeedCollector,
    summarizer: &SummaryService,
    collect_timeout: Duration,
    cancel: &Cancellation,
) -> Result<IngestReport> {
    let source_repo = SourceRepository::new(db);
    let sources = cancel
        .run(with_retry("list_sources", || source_repo.list_all()))
        .await?;

    let mut total = IngestReport::default();

    for source in sources {
        tracing::info!("Collecting source: {}", source.name);

        let candidates = match cancel
            .run_with_timeout(collect_timeout, collector.collect(&source))
            .await
        {
            Ok(candidates) => candidates,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                tracing::error!("Failed to collect source '{}': {}", source.name, e);
                continue;
            }
        };

        match ingest_candidates(db, summarizer, &source, candidates, cancel).await {
            Ok(report) => {
                tracing::info!(
                    "Source '{}': {} new, {} known",
                    source.name,
                    report.stored,
                    report.duplicates
                );
                total.merge(report);
            }
            // Deleted while we were collecting; its articles would cascade away anyway
            Err(e) if e.is_constraint() => {
                tracing::warn!("Source '{}' vanished during collection: {}", source.name, e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(total)
}

/// Hand the next batch to the publisher and record what went out
pub async fn deliver_pending(
    db: &Database,
    publisher: &dyn Publisher,
    window: &SelectionWindow,
    cancel: &Cancellation,
) -> Result<DeliveryReport> {
    let article_repo = ArticleRepository::new(db);
    let mut report = DeliveryReport::default();

    if window.is_empty() {
        return Ok(report);
    }

    let batch = cancel
        .run(with_retry("select_pending", || article_repo.select(window)))
        .await?;

    for article in batch {
        match cancel.run(publisher.publish(&article)).await {
            Ok(()) => {}
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                tracing::warn!("Failed to publish '{}': {}", article.link, e);
                report.failed += 1;
                continue;
            }
        }

        let marked = cancel
            .run(with_retry("mark_as_posted", || {
                article_repo.mark_as_posted_if_pending(article.id)
            }))
            .await;

        match marked {
            Ok(()) => {
                tracing::debug!("Posted article: {}", article.title);
                report.posted += 1;
            }
            Err(Error::NotPending(id)) => {
                tracing::warn!(article_id = id, "Article was already recorded as posted");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if report.posted > 0 {
        tracing::info!("Posted {} articles", report.posted);
    }

    Ok(report)
}
