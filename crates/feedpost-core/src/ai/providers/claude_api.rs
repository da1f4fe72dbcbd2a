use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{compose_prompt, Summarizer};
use crate::{Error, Result};

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Option<Vec<ClaudeContent>>,
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: String,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

/// Claude/Anthropic API provider
pub struct ClaudeApiProvider {
    client: Client,
    api_key: String,
    model: String,
    prompt: String,
    max_tokens: u32,
}

impl ClaudeApiProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompt: prompt.to_string(),
            max_tokens,
        })
    }

    async fn chat(&self, prompt: String) -> Result<String> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::AiProvider(format!("Claude API request failed: {}", e)))?;

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| Error::AiProvider(format!("Failed to parse Claude response: {}", e)))?;

        if let Some(error) = claude_response.error {
            return Err(Error::AiProvider(format!("Claude API error: {}", error.message)));
        }

        claude_response
            .content
            .and_then(|c| c.into_iter().next())
            .map(|c| c.text)
            .ok_or_else(|| Error::AiProvider("Empty Claude response".to_string()))
    }
}

#[async_trait::async_trait]
impl Summarizer for ClaudeApiProvider {
    fn name(&self) -> &str {
        "claude_api"
    }

    async fn summarize(&self, link: &str, title: &str) -> Result<String> {
        self.chat(compose_prompt(link, title, &self.prompt)).await
    }
}
