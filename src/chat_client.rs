//! HTTP transport for OpenAI-style chat-completions endpoints.

use std::time::Duration;

use agenda_core::config::RemoteConfig;
use agenda_core::error::{AgendaError, AgendaResult};
use agenda_core::remote::protocol::{ChatCompletion, ChatRequest};
use agenda_core::remote::{ChatMessage, ChatTransport};
use async_trait::async_trait;
use log::debug;

/// Longest error body kept in `RemoteStatus` errors.
const MAX_ERROR_BODY: usize = 300;

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsClient {
    pub fn new(config: &RemoteConfig, api_key: String, timeout: Duration) -> AgendaResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("agenda/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AgendaError::Remote(e.to_string()))?;

        Ok(ChatCompletionsClient {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ChatTransport for ChatCompletionsClient {
    async fn complete(&self, messages: &[ChatMessage]) -> AgendaResult<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgendaError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgendaError::RemoteStatus {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AgendaError::Remote(format!("Invalid response body: {e}")))?;
        let content = completion.into_content()?;
        debug!("remote model replied with {} chars", content.chars().count());
        Ok(content)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
