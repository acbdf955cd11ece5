//! Configuration management for Olloquy
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{OlloquyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Olloquy
///
/// This structure holds all configuration needed for the chat client,
/// covering the Ollama backend and attachment ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Ollama backend configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Attachment ingestion configuration
    #[serde(default)]
    pub attachments: AttachmentsConfig,
}

/// Ollama backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to request
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Generation cap sent as `options.num_predict` on every request
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    /// Request timeout in seconds, covering the full streamed response
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_num_predict() -> u32 {
    80
}

fn default_timeout() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            num_predict: default_num_predict(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Attachment ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    /// Directory where raw copies and chunk records are written
    #[serde(default = "default_attachments_dir")]
    pub dir: String,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_attachments_dir() -> String {
    "temp_storage".to_string()
}

fn default_chunk_size() -> usize {
    crate::chunker::DEFAULT_CHUNK_SIZE
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            dir: default_attachments_dir(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| OlloquyError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| OlloquyError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("OLLOQUY_OLLAMA_HOST") {
            self.ollama.host = host;
        }

        if let Ok(model) = std::env::var("OLLOQUY_OLLAMA_MODEL") {
            self.ollama.model = model;
        }

        if let Ok(num_predict) = std::env::var("OLLOQUY_NUM_PREDICT") {
            if let Ok(value) = num_predict.parse() {
                self.ollama.num_predict = value;
            } else {
                tracing::warn!("Invalid OLLOQUY_NUM_PREDICT: {}", num_predict);
            }
        }

        if let Ok(timeout) = std::env::var("OLLOQUY_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.ollama.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid OLLOQUY_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(dir) = std::env::var("OLLOQUY_ATTACHMENTS_DIR") {
            self.attachments.dir = dir;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(host) = &cli.host {
            self.ollama.host = host.clone();
        }

        if let Some(model) = &cli.model {
            self.ollama.model = model.clone();
        }

        if let Some(dir) = &cli.attachments_dir {
            self.attachments.dir = dir.clone();
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Returns
    ///
    /// Returns Ok if configuration is valid
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.ollama.host.is_empty() {
            return Err(OlloquyError::Config("ollama.host cannot be empty".to_string()).into());
        }

        if self.ollama.model.is_empty() {
            return Err(OlloquyError::Config("ollama.model cannot be empty".to_string()).into());
        }

        if self.ollama.num_predict == 0 {
            return Err(OlloquyError::Config(
                "ollama.num_predict must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ollama.timeout_seconds == 0 {
            return Err(OlloquyError::Config(
                "ollama.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.attachments.chunk_size == 0 {
            return Err(OlloquyError::Config(
                "attachments.chunk_size must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
