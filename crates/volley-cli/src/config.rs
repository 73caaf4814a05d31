//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for volley
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default model to use
    pub model: Option<String>,
    /// Completion token limit per request
    pub max_tokens: Option<u32>,
    /// Number of turns per run
    pub turns: Option<usize>,
    /// Follow-up user message appended after each turn
    pub follow_up: Option<String>,
    /// Dataset CSV path
    pub dataset: Option<String>,
    /// Category filter value for dataset rows
    pub category: Option<String>,
    /// Root directory for run artifacts
    pub log_root: Option<String>,
    /// Provider completion window (opaque, e.g. "24h")
    pub completion_window: Option<String>,
    /// System message seeded into every conversation
    pub system_prompt: Option<String>,
    /// Dataset column names
    #[serde(default)]
    pub columns: Columns,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// Dataset column configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub prompt: String,
    pub category: String,
    pub identifier: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            prompt: "Behavior".to_string(),
            category: "FunctionalCategory".to_string(),
            identifier: "BehaviorID".to_string(),
        }
    }
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("volley")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for VOLLEY_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("VOLLEY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        let dir = path.parent().unwrap();
        fs::create_dir_all(dir)?;

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some("gpt-4o-mini".to_string()),
            max_tokens: Some(1000),
            turns: Some(3),
            follow_up: Some("Please answer the question".to_string()),
            category: Some("standard".to_string()),
            log_root: Some("logs".to_string()),
            completion_window: Some("24h".to_string()),
            ..Default::default()
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the API key, checking config then environment
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_keys.openai.clone() {
            return Some(key);
        }
        std::env::var("OPENAI_API_KEY").ok()
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# volley configuration file
# Place at ~/.config/volley/config.toml (Linux/Mac) or %APPDATA%\volley\config.toml (Windows)

# Default model to use
model = "gpt-4o-mini"

# Completion token limit per request
max_tokens = 1000

# Number of turns per run
turns = 3

# Follow-up user message appended after each turn
follow_up = "Please answer the question"

# Dataset CSV and the category value rows must match
# dataset = "harmbench_behaviors_text_test.csv"
category = "standard"

# Root directory for per-run artifacts
log_root = "logs"

# Provider completion window (opaque)
completion_window = "24h"

# System message seeded into every conversation
# system_prompt = "You are a helpful assistant."

# Dataset column names
[columns]
prompt = "Behavior"
category = "FunctionalCategory"
identifier = "BehaviorID"

# API key (optional - the OPENAI_API_KEY environment variable is preferred)
[api_keys]
# openai = "sk-..."
"#
}
