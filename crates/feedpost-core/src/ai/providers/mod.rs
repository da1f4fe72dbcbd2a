mod claude_api;
mod disabled;
mod gemini_api;
mod openai;

use std::sync::Arc;

pub use claude_api::ClaudeApiProvider;
pub use disabled::DisabledSummarizer;
pub use gemini_api::GeminiApiProvider;
pub use openai::OpenAiProvider;

use crate::config::AppConfig;
use crate::{Error, Result};

/// Turns an article link and title into a short summary.
///
/// Implementations return the raw model output; trimming and cutting a
/// dangling sentence happen in [`SummaryService`](crate::ai::SummaryService).
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    async fn summarize(&self, link: &str, title: &str) -> Result<String>;
}

/// Text sent to the model: link, title, then the configured instruction
pub(crate) fn compose_prompt(link: &str, title: &str, instruction: &str) -> String {
    format!("{link} {title} {instruction}")
}

/// Build the provider selected in the configuration.
///
/// Missing credentials do not fail startup: ingestion still works, it just
/// stores articles without a summary.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Summarizer>> {
    let ai = &config.ai;

    let Some(api_key) = config.active_api_key().filter(|_| ai.enabled) else {
        tracing::warn!(provider = %ai.provider, "Summarizer is disabled, articles will be stored without summaries");
        return Ok(Arc::new(DisabledSummarizer));
    };

    let timeout = ai.timeout();
    let provider: Arc<dyn Summarizer> = match ai.provider.as_str() {
        "gemini_api" => Arc::new(GeminiApiProvider::new(
            api_key,
            &ai.gemini_model,
            &ai.prompt,
            ai.max_summary_tokens,
            timeout,
        )?),
        "openai" => Arc::new(OpenAiProvider::new(
            api_key,
            &ai.openai_model,
            &ai.prompt,
            ai.max_summary_tokens,
        )),
        "claude_api" => Arc::new(ClaudeApiProvider::new(
            api_key,
            &ai.claude_model,
            &ai.prompt,
            ai.max_summary_tokens,
            timeout,
        )?),
        other => {
            return Err(Error::Config(format!("Unknown AI provider: {other}")));
        }
    };

    tracing::info!(provider = provider.name(), "Summarizer is enabled: true");
    Ok(provider)
}
