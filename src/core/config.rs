//! Configuration management for tooldriver
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/tooldriver/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{DriverError, Result};

/// Main configuration for tooldriver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model service configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    /// File-editor tool configuration
    #[serde(default)]
    pub editor: EditorConfig,
    /// Shell tool configuration
    #[serde(default)]
    pub shell: ShellConfig,
    /// Conversation loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Token pricing
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Session log configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key; never written back to the config file
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// Base URL of the Messages API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Maximum output tokens per response
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// File-editor tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Directory that sandboxes all editor operations
    pub root: PathBuf,
    /// Prefix the model puts in front of sandbox paths
    pub sandbox_prefix: String,
}

/// Shell tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell program commands are run through
    pub program: String,
    /// Skip command execution entirely
    pub mock: bool,
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Optional system prompt sent with every request
    pub system_prompt: Option<String>,
    /// Maximum model turns; unbounded when unset
    pub max_turns: Option<usize>,
    /// Stop the loop as soon as a tool reports an error
    pub halt_on_tool_error: bool,
}

/// Token pricing in USD per million tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Session log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory session log files are written to
    pub dir: PathBuf,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| v == "true" || v == "1")
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("ANTHROPIC_API_KEY").ok(),
            base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            model: env::var("TOOLDRIVER_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string()),
            max_tokens: 1024,
            timeout_secs: 300,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            root: env::var("TOOLDRIVER_EDITOR_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("editor_dir")),
            sandbox_prefix: "/repo/".to_string(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            mock: env_flag("TOOLDRIVER_MOCK_SHELL").unwrap_or(false),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_turns: None,
            halt_on_tool_error: true,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: env::var("TOOLDRIVER_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
            level: env::var("TOOLDRIVER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tooldriver")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(DriverError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| DriverError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DriverError::config(format!("Failed to parse config: {}", e)))
    }

    /// Overlay environment variables on top of file values
    fn apply_env(&mut self) {
        if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Ok(url) = env::var("ANTHROPIC_BASE_URL") {
            self.anthropic.base_url = url;
        }
        if let Ok(model) = env::var("TOOLDRIVER_MODEL") {
            self.anthropic.model = model;
        }
        if let Ok(dir) = env::var("TOOLDRIVER_EDITOR_DIR") {
            self.editor.root = PathBuf::from(dir);
        }
        if let Some(mock) = env_flag("TOOLDRIVER_MOCK_SHELL") {
            self.shell.mock = mock;
        }
        if let Ok(dir) = env::var("TOOLDRIVER_LOG_DIR") {
            self.logging.dir = PathBuf::from(dir);
        }
        if let Ok(level) = env::var("TOOLDRIVER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| DriverError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DriverError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(Self::config_file(), content)
            .map_err(|e| DriverError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// API key, or a config error naming the variable to set
    pub fn api_key(&self) -> Result<&str> {
        self.anthropic
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DriverError::config("ANTHROPIC_API_KEY is not set"))
    }

    /// Full URL of the messages endpoint
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.anthropic.base_url.trim_end_matches('/'))
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
