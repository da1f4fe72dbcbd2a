mod article_repo;
mod database;
mod source_repo;

pub use article_repo::ArticleRepository;
pub use database::Database;
pub use source_repo::SourceRepository;

/// `COUNT(*)` as a `u32`, clamped instead of wrapping
pub(crate) fn saturating_count(count: i64) -> u32 {
    u32::try_from(count).unwrap_or(if count < 0 { 0 } else { u32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_count() {
        assert_eq!(saturating_count(42), 42);
        assert_eq!(saturating_count(i64::from(u32::MAX) + 1), u32::MAX);
        assert_eq!(saturating_count(-1), 0);
    }
}
