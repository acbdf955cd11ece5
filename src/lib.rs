//! Olloquy - Streaming terminal chat for local Ollama models library
//!
//! This library provides the core functionality for the Olloquy chat client,
//! including conversation management, the streaming Ollama client, and text
//! file attachment ingestion.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Conversation store, titles, and the message log
//! - `ollama`: Streaming chat client for the Ollama HTTP API
//! - `controller`: Orchestration of prompts, replies, and attachments
//! - `attachment`: Text file ingestion and storage
//! - `chunker`: Fixed-size character chunking
//! - `repl`: Interactive readline loop
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use olloquy::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     olloquy::repl::run(config).await
//! }
//! ```

pub mod attachment;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod ollama;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use attachment::{AttachmentStore, Ingested};
pub use config::Config;
pub use controller::ChatController;
pub use error::{OlloquyError, Result};
pub use ollama::OllamaClient;
pub use session::{ChatSession, Conversation, ConversationId, Message, Role};
