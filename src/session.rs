//! Conversation state for olloquy
//!
//! This module holds the in-memory conversation model: message roles, the
//! per-conversation message log, timestamp-derived conversation ids, and the
//! [`ChatSession`] that keeps every conversation plus the active selection.
//!
//! The session is plain owned state. It is created once at startup, handed to
//! the controller by value, and mutated only through its methods; nothing here
//! performs I/O or suspends.

use crate::error::{OlloquyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Assistant greeting seeded into every new conversation.
pub const GREETING: &str = "How can I help you?";

/// Title given to a conversation before the first user prompt arrives.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Maximum title length in code points before the ellipsis is applied.
const TITLE_MAX_CHARS: usize = 30;

/// Timestamp format backing conversation ids (second resolution).
const ID_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Author of a message
///
/// Serializes to the lowercase role names the model backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation
    User,
    /// The model side of the conversation
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn
///
/// Messages are immutable once appended, except the most recent assistant
/// message, which accumulates content while a stream is in flight. The serde
/// shape (`{"role": ..., "content": ...}`) is exactly the turn format of the
/// backend wire contract, so message logs serialize straight into requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message
    pub role: Role,
    /// Message text; grows incrementally for a streaming assistant reply
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Opaque key identifying a conversation
///
/// Derived from the creation instant at second resolution. Two creations
/// within the same second produce the same id; the session treats that as a
/// replacement, which matches the single-user pacing this tool is built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    fn now() -> Self {
        Self(chrono::Utc::now().format(ID_FORMAT).to_string())
    }

    /// The id as a displayable string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A titled, ordered message log
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    title: String,
    messages: Vec<Message>,
}

impl Conversation {
    /// Create a conversation seeded with the assistant greeting
    fn new(id: ConversationId) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: vec![Message::assistant(GREETING)],
        }
    }

    /// The conversation's id
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// The conversation's title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The ordered message log
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn append_to_last(&mut self, text: &str) {
        // The greeting guarantees a last message exists from creation
        if let Some(last) = self.messages.last_mut() {
            last.content.push_str(text);
        }
    }
}

/// In-memory store of conversations plus the active selection
///
/// This is the single owner of all conversation state. Mutations flow through
/// the controller; the interactive surface only reads via [`Self::list_conversations`]
/// and [`Self::active_messages`].
///
/// # Examples
///
/// ```
/// use olloquy::session::{ChatSession, GREETING, Role};
///
/// let mut session = ChatSession::new();
/// let messages = session.active_messages();
/// assert_eq!(messages.len(), 1);
/// assert_eq!(messages[0].role, Role::Assistant);
/// assert_eq!(messages[0].content, GREETING);
/// ```
#[derive(Debug, Default)]
pub struct ChatSession {
    conversations: HashMap<ConversationId, Conversation>,
    /// Creation order, oldest first; listing walks it in reverse
    order: Vec<ConversationId>,
    active: Option<ConversationId>,
}

impl ChatSession {
    /// Create an empty session with no conversations
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new conversation, make it active, and return its id
    ///
    /// The conversation starts with one assistant greeting message and the
    /// default title.
    pub fn create_conversation(&mut self) -> ConversationId {
        let id = ConversationId::now();
        self.install(Conversation::new(id.clone()));
        tracing::info!("Created conversation {}", id);
        id
    }

    fn install(&mut self, conversation: Conversation) {
        let id = conversation.id().clone();
        if !self.order.contains(&id) {
            self.order.push(id.clone());
        }
        self.conversations.insert(id.clone(), conversation);
        self.active = Some(id);
    }

    /// Return the active conversation's id, creating a conversation first if
    /// none exists
    ///
    /// This is the single lazy-initialization point: every path that needs an
    /// active conversation goes through here.
    pub fn ensure_active(&mut self) -> ConversationId {
        match &self.active {
            Some(id) => id.clone(),
            None => self.create_conversation(),
        }
    }

    /// The active conversation's message log, creating a conversation first
    /// if none exists
    pub fn active_messages(&mut self) -> &[Message] {
        let id = self.ensure_active();
        match self.conversations.get(&id) {
            Some(conversation) => conversation.messages(),
            None => &[],
        }
    }

    /// Switch the active conversation
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::ConversationNotFound` if `id` was never
    /// created; the active selection is left unchanged in that case.
    pub fn set_active(&mut self, id: &ConversationId) -> Result<()> {
        if !self.conversations.contains_key(id) {
            return Err(OlloquyError::ConversationNotFound(id.to_string()).into());
        }
        self.active = Some(id.clone());
        Ok(())
    }

    /// Append a message to the active conversation
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::NoActiveConversation` if no conversation is
    /// active. Callers that went through [`Self::ensure_active`] or
    /// [`Self::active_messages`] cannot hit this.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) -> Result<()> {
        let conversation = self.active_conversation_mut()?;
        conversation.messages.push(Message {
            role,
            content: content.into(),
        });
        Ok(())
    }

    /// Append text to the active conversation's most recent message
    ///
    /// This is the token-accumulation path: the controller appends an empty
    /// assistant placeholder, then feeds each stream token through here.
    ///
    /// # Errors
    ///
    /// Returns `OlloquyError::NoActiveConversation` if no conversation is
    /// active.
    pub fn append_to_last_message(&mut self, text: &str) -> Result<()> {
        let conversation = self.active_conversation_mut()?;
        conversation.append_to_last(text);
        Ok(())
    }

    /// Set the active conversation's title from its first user prompt
    ///
    /// Applies the first 30 code points of `first_user_content`, with an
    /// ellipsis when truncated, but only while the title still holds the
    /// default placeholder. Later calls are no-ops, so the title reflects the
    /// first prompt even if more are submitted.
    pub fn derive_title_if_needed(&mut self, first_user_content: &str) {
        if let Ok(conversation) = self.active_conversation_mut() {
            if conversation.title == DEFAULT_TITLE {
                conversation.title = derive_title(first_user_content);
            }
        }
    }

    /// All conversations as `(id, title)` pairs, most recently created first
    pub fn list_conversations(&self) -> Vec<(ConversationId, String)> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| {
                self.conversations
                    .get(id)
                    .map(|c| (id.clone(), c.title().to_string()))
            })
            .collect()
    }

    /// The active conversation's id, if one has been created
    pub fn active_id(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    /// Look up a conversation by id
    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    /// The active conversation, if one has been created
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active
            .as_ref()
            .and_then(|id| self.conversations.get(id))
    }

    fn active_conversation_mut(&mut self) -> Result<&mut Conversation> {
        let id = self.active.clone().ok_or(OlloquyError::NoActiveConversation)?;
        self.conversations
            .get_mut(&id)
            .ok_or(OlloquyError::NoActiveConversation.into())
    }

    /// Number of conversations in the session
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// True if no conversation has been created yet
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// Truncate a prompt into a conversation title
fn derive_title(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if content.chars().nth(TITLE_MAX_CHARS).is_some() {
        title.push_str("...");
    }
    title
}
