//! Wire types for OpenAI-style chat-completions endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::{Role, Turn};
use crate::error::{AgendaError, AgendaResult};

/// One message as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage { role: Role::User, content: content.into() }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        ChatMessage { role: turn.role, content: turn.text.clone() }
    }
}

/// Anything that can answer a list of chat messages with the assistant's text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> AgendaResult<String>;
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice. Missing or blank content is an error.
    pub fn into_content(self) -> AgendaResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AgendaError::RemoteEmpty)
    }
}
