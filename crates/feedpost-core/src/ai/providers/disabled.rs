use super::Summarizer;
use crate::{Error, Result};

/// Stand-in when no API key is configured
pub struct DisabledSummarizer;

#[async_trait::async_trait]
impl Summarizer for DisabledSummarizer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn summarize(&self, _link: &str, _title: &str) -> Result<String> {
        Err(Error::SummarizerDisabled)
    }
}
