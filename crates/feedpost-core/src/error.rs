use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which integrity rule a rejected statement ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ForeignKey,
    Unique,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The store could not be reached or a statement failed to execute
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Constraint violation ({kind}): {message}")]
    Constraint { kind: ConstraintKind, message: String },

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    /// Conditional mark-as-posted matched no pending row
    #[error("Article {0} is not pending delivery")]
    NotPending(i64),

    #[error("Invalid article: {0}")]
    InvalidArticle(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Summarizer is disabled: no API key configured")]
    SummarizerDisabled,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                sqlx::error::ErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                sqlx::error::ErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                sqlx::error::ErrorKind::CheckViolation => Some(ConstraintKind::Check),
                _ => None,
            },
            _ => None,
        };

        match (kind, &err) {
            (Some(kind), sqlx::Error::Database(db_err)) => Error::Constraint {
                kind,
                message: db_err.message().to_string(),
            },
            _ => Error::Database(err),
        }
    }
}

impl Error {
    /// Summarization failed, timed out or is not configured
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(
            self,
            Error::AiProvider(_) | Error::SummarizerDisabled | Error::Timeout(_) | Error::Http(_)
        )
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Error::Constraint { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SourceNotFound(_) | Error::ArticleNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
