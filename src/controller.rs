//! Chat orchestration
//!
//! [`ChatController`] is the only component with user-visible side effects.
//! It owns the session, the backend client, and the attachment store, and it
//! is the sole mutation path into the conversation log: prompts, streamed
//! tokens, and attachment events all land in the log through here.
//!
//! Failures never escape a user action. A backend refusal, an interrupted
//! stream, or an unreadable attachment becomes a conversation-log entry in
//! user-facing text, and the action returns normally.

use crate::attachment::AttachmentStore;
use crate::error::Result;
use crate::ollama::OllamaClient;
use crate::session::{ChatSession, ConversationId, Message, Role};
use futures::StreamExt;
use std::path::Path;

/// How many chunks are echoed into the conversation after an ingestion.
const CHUNKS_SHOWN: usize = 3;

/// Orchestrates prompts, attachments, and streaming replies
///
/// The controller takes `&mut self` for every mutating action, so a second
/// prompt cannot start while a stream is being drained; callers that need to
/// queue input simply await the current submission first.
pub struct ChatController {
    session: ChatSession,
    client: OllamaClient,
    attachments: AttachmentStore,
}

impl ChatController {
    /// Create a controller with a fresh, empty session
    pub fn new(client: OllamaClient, attachments: AttachmentStore) -> Self {
        Self {
            session: ChatSession::new(),
            client,
            attachments,
        }
    }

    /// Read access to the session for display purposes
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// The backend client in use
    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    /// The active conversation's message log, creating one if none exists
    pub fn active_messages(&mut self) -> &[Message] {
        self.session.active_messages()
    }

    /// Start a new conversation and make it active
    pub fn new_conversation(&mut self) -> ConversationId {
        self.session.create_conversation()
    }

    /// Switch to another conversation
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::ConversationNotFound` for an unknown id; the
    /// selection is unchanged in that case.
    pub fn switch_conversation(&mut self, id: &ConversationId) -> Result<()> {
        self.session.set_active(id)
    }

    /// All conversations as `(id, title)` pairs, most recent first
    pub fn list_conversations(&self) -> Vec<(ConversationId, String)> {
        self.session.list_conversations()
    }

    /// Submit a user prompt and stream the assistant reply into the log
    ///
    /// The prompt is appended as a user message, the title derived if this
    /// was the conversation's first prompt, and an empty assistant
    /// placeholder appended. Tokens are then drained from the backend in
    /// arrival order; each one is appended to the placeholder before
    /// `on_token` sees it, so the log always holds at least as much as the
    /// render surface has shown.
    ///
    /// If the stream fails after producing tokens, the partial reply stands.
    /// If it fails before producing anything, the placeholder is filled with
    /// the failure text (also passed to `on_token`) so the log never holds a
    /// silent empty reply.
    ///
    /// # Arguments
    ///
    /// * `prompt` - The user's message
    /// * `on_token` - Called once per appended fragment, for incremental
    ///   rendering
    pub async fn submit_prompt(
        &mut self,
        prompt: &str,
        mut on_token: impl FnMut(&str),
    ) -> Result<()> {
        self.session.ensure_active();
        self.session.append_message(Role::User, prompt)?;
        self.session.derive_title_if_needed(prompt);

        // The context ends with the prompt; the placeholder appended next is
        // local bookkeeping and is not sent to the backend
        let context = self.session.active_messages().to_vec();
        self.session.append_message(Role::Assistant, "")?;

        let mut stream = match self.client.stream_chat(&context).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                let note = e.to_string();
                self.session.append_to_last_message(&note)?;
                on_token(&note);
                return Ok(());
            }
        };

        let mut received_any = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    self.session.append_to_last_message(&token)?;
                    on_token(&token);
                    received_any = true;
                }
                Err(e) => {
                    tracing::warn!("Chat stream interrupted: {}", e);
                    if !received_any {
                        let note = e.to_string();
                        self.session.append_to_last_message(&note)?;
                        on_token(&note);
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run the attachment flow for the file at `path`
    ///
    /// Appends a user message announcing the file, then ingests it. Success
    /// appends the preview message and a message listing the first
    /// [`CHUNKS_SHOWN`] chunks; failure appends a single message carrying the
    /// cause. Either way the conversation log describes what happened and the
    /// call returns normally.
    pub fn attach_file(&mut self, path: &Path) -> Result<()> {
        self.session.ensure_active();

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        self.session.append_message(
            Role::User,
            format!("I've uploaded a file named '{}'.", file_name),
        )?;

        match self.attachments.ingest_file(path) {
            Ok(ingested) => {
                self.session.append_message(
                    Role::User,
                    format!("Here's a preview of the file:\n\n{}", ingested.preview),
                )?;

                let shown: Vec<String> = ingested
                    .chunks
                    .iter()
                    .take(CHUNKS_SHOWN)
                    .enumerate()
                    .map(|(i, chunk)| format!("Chunk {}: {}", i + 1, chunk))
                    .collect();
                self.session.append_message(
                    Role::User,
                    format!(
                        "File processed successfully.\nHere are the first chunks:\n\n{}",
                        shown.join("\n")
                    ),
                )?;
            }
            Err(e) => {
                tracing::warn!("Attachment ingestion failed: {}", e);
                self.session
                    .append_message(Role::User, format!("Couldn't read the file: {}", e))?;
            }
        }

        Ok(())
    }
}
