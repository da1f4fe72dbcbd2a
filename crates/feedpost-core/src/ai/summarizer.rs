use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::Semaphore;

use super::providers::{self, Summarizer};
use crate::cancel::Cancellation;
use crate::config::AppConfig;
use crate::{Error, Result};

const TERMINATORS: [char; 4] = ['.', '!', '?', '…'];
const CLOSERS: [char; 6] = ['"', '\'', '”', '’', ')', ']'];

/// Words that end in a period without ending the sentence
const ABBREVIATIONS: [&str; 16] = [
    "mr", "mrs", "ms", "dr", "prof", "st", "sr", "jr", "vs", "inc", "ltd", "co", "e.g", "i.e",
    "u.s", "no",
];

/// A terminator run, optional closing quotes or brackets, then whitespace
static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?…]+["'”’)\]]*\s"#).expect("sentence boundary pattern is valid")
});

/// Summarizer wrapper used by the ingestion path
pub struct SummaryService {
    provider: Arc<dyn Summarizer>,
    permits: Semaphore,
    timeout: Duration,
}

impl SummaryService {
    pub fn new(provider: Arc<dyn Summarizer>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            provider,
            permits: Semaphore::new(concurrency.max(1)),
            timeout,
        }
    }

    /// Build the configured provider with the configured limits
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = providers::from_config(config)?;
        Ok(Self::new(provider, config.ai.timeout(), config.ai.concurrency))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Summarize one article, bounded by the configured timeout.
    /// The text comes back trimmed and without a trailing partial sentence.
    pub async fn summarize(&self, link: &str, title: &str, cancel: &Cancellation) -> Result<String> {
        let _permit = cancel
            .run(async {
                self.permits
                    .acquire()
                    .await
                    .map_err(|_| Error::AiProvider("summarizer is shut down".to_string()))
            })
            .await?;

        let raw = cancel
            .run_with_timeout(self.timeout, self.provider.summarize(link, title))
            .await?;

        Ok(clean_summary(&raw))
    }

    /// Summary for an article about to be stored.
    ///
    /// Any upstream failure becomes `None` plus a warning so the article is
    /// still ingested. Only cancellation is passed back to the caller.
    pub async fn summarize_for_ingest(
        &self,
        link: &str,
        title: &str,
        cancel: &Cancellation,
    ) -> Result<Option<String>> {
        match self.summarize(link, title, cancel).await {
            Ok(summary) if summary.is_empty() => Ok(None),
            Ok(summary) => Ok(Some(summary)),
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(Error::SummarizerDisabled) => {
                tracing::warn!(link, "Summarizer disabled, storing without summary");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(link, provider = self.provider_name(), error = %e, "Failed to summarize article");
                Ok(None)
            }
        }
    }
}

/// Best-effort cleanup of model output.
///
/// Trims whitespace and, when the text stops mid-sentence, cuts it back to
/// the last complete sentence. A boundary is a terminator followed by
/// whitespace, so decimals never split; a period after a known abbreviation
/// or a single initial is not a boundary. Text with no boundary at all is
/// returned trimmed but otherwise intact.
pub fn clean_summary(raw: &str) -> String {
    let text = raw.trim();

    if text.is_empty() || ends_with_terminator(text) {
        return text.to_string();
    }

    match last_sentence_end(text) {
        Some(end) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}

fn ends_with_terminator(text: &str) -> bool {
    text.trim_end_matches(CLOSERS).ends_with(TERMINATORS)
}

fn last_sentence_end(text: &str) -> Option<usize> {
    SENTENCE_BOUNDARY
        .find_iter(text)
        .filter(|m| !(m.as_str().starts_with('.') && is_abbreviation(&text[..m.start()])))
        .map(|m| m.end())
        .last()
}

/// Whether the word right before a period is an abbreviation or an initial
fn is_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\'', '“', '‘']);

    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return first.is_uppercase();
    }

    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}
