//! Which unposted articles go out next, and in what order.
//!
//! Discovery time drives the order rather than publication time: feeds
//! backfill and misreport `published_at`, while `created_at` is stamped by the
//! store. Source priority breaks ties between items discovered at the same
//! instant, and the row id makes the order total. `published_at` is still used
//! as the hard recency cut so a backlog does not resurface after downtime.

use chrono::{DateTime, Duration, Utc};

use crate::config::DeliveryConfig;

/// Recency bound and batch size for one selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionWindow {
    /// Inclusive lower bound on `published_at`
    pub since: DateTime<Utc>,
    pub limit: u32,
}

impl SelectionWindow {
    pub fn new(since: DateTime<Utc>, limit: u32) -> Self {
        Self { since, limit }
    }

    /// Window covering `span` back from `now`. A span reaching past the
    /// representable range covers everything.
    pub fn trailing(now: DateTime<Utc>, span: Duration, limit: u32) -> Self {
        let since = now.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(since, limit)
    }

    pub fn from_config(config: &DeliveryConfig, now: DateTime<Utc>) -> Self {
        Self::trailing(now, Duration::hours(i64::from(config.window_hours)), config.batch_limit)
    }

    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }
}

pub(crate) const SELECT_PENDING: &str = r#"
SELECT a.id, a.source_id, a.title, a.link, a.summary,
       a.published_at, a.created_at, a.posted_at
FROM articles a
JOIN sources s ON s.id = a.source_id
WHERE a.posted_at IS NULL
  AND a.published_at >= ?
ORDER BY a.created_at DESC, s.priority DESC, a.id DESC
LIMIT ?
"#;
