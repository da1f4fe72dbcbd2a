use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed origin polled by the collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    /// Higher is preferred when selecting the next batch
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

/// Data required to register a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub feed_url: String,
    pub priority: i64,
}

impl NewSource {
    pub const DEFAULT_PRIORITY: i64 = 1;

    pub fn new(name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// Delivery state of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleState {
    Discovered,
    Delivered,
}

/// A discovered item, deduplicated by link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Data required to store a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    /// Falls back to ingestion time when the feed did not say
    pub published_at: Option<DateTime<Utc>>,
}

/// What a collector yields for one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn is_posted(&self) -> bool {
        self.posted_at.is_some()
    }

    pub fn state(&self) -> ArticleState {
        if self.is_posted() {
            ArticleState::Delivered
        } else {
            ArticleState::Discovered
        }
    }

    /// Summary text, or an empty string when none was produced
    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

impl NewArticle {
    pub fn from_candidate(source_id: i64, candidate: Candidate, summary: Option<String>) -> Self {
        Self {
            source_id,
            title: candidate.title,
            link: candidate.link,
            summary: summary.filter(|s| !s.trim().is_empty()),
            published_at: candidate.published_at,
        }
    }
}
