//! Command-line interface definition for Olloquy
//!
//! This module defines the CLI structure using clap's derive API.
//! Olloquy runs a single interactive chat session, so the surface is
//! flags only with no subcommands.

use clap::Parser;

/// Olloquy - Streaming terminal chat for local Ollama models
///
/// Chat with a locally served model, keep several conversations going
/// at once, and pull text files into the discussion.
#[derive(Parser, Debug, Clone)]
#[command(name = "olloquy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the Ollama server host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the model to chat with
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the attachment storage directory
    #[arg(long)]
    pub attachments_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            host: None,
            model: None,
            attachments_dir: None,
            verbose: false,
        }
    }
}
