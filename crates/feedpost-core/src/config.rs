use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub collect: CollectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Enable AI summarization
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// AI provider: "gemini_api", "openai", "claude_api"
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    /// Instruction appended after the article link and title
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Gemini API key (for gemini_api provider)
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// OpenAI API key (for openai provider)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Claude/Anthropic API key (for claude_api provider)
    #[serde(default)]
    pub claude_api_key: Option<String>,
    /// Claude model name
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    /// Max tokens for summary
    #[serde(default = "default_max_tokens")]
    pub max_summary_tokens: u32,
    /// Upper bound on a single summarization call
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    /// Summarization requests allowed in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            provider: default_ai_provider(),
            prompt: default_prompt(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            claude_api_key: None,
            claude_model: default_claude_model(),
            max_summary_tokens: default_max_tokens(),
            timeout_secs: default_ai_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Only articles published within this many hours are eligible
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    /// Max articles handed to the publisher per tick
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,
    /// Delivery loop interval in seconds
    #[serde(default = "default_delivery_interval")]
    pub interval_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            batch_limit: default_batch_limit(),
            interval_secs: default_delivery_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Collector loop interval in seconds (0 disables collection)
    #[serde(default = "default_collect_interval")]
    pub interval_secs: u64,
    /// Upper bound on a single source's collection, in seconds
    #[serde(default = "default_collect_timeout")]
    pub timeout_secs: u64,
}

impl CollectConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_collect_interval(),
            timeout_secs: default_collect_timeout(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedpost")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ai_provider() -> String {
    "gemini_api".to_string()
}

fn default_prompt() -> String {
    "Summarize the article behind this link in 2-3 sentences. \
Reply with the summary only."
        .to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_claude_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_ai_timeout() -> u64 {
    120 // 2 minutes
}

fn default_concurrency() -> usize {
    1
}

fn default_window_hours() -> u32 {
    24
}

fn default_batch_limit() -> u32 {
    10
}

fn default_delivery_interval() -> u64 {
    60
}

fn default_collect_interval() -> u64 {
    600 // 10 minutes
}

fn default_collect_timeout() -> u64 {
    60
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/feedpost/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedpost")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("feedpost.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Key for the configured provider, if any
    pub fn active_api_key(&self) -> Option<&str> {
        let key = match self.ai.provider.as_str() {
            "openai" => self.ai.openai_api_key.as_deref(),
            "claude_api" => self.ai.claude_api_key.as_deref(),
            _ => self.ai.gemini_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}
