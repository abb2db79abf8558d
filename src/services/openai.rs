use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ChatMessage, ResponseGenerator};
use crate::config::ServicesConfig;

/// OpenAI chat completions client
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl OpenAiChat {
    pub fn new(config: &ServicesConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
        }
    }

    fn request<'a>(&'a self, history: &'a [ChatMessage], prompt: &str) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(prompt));

        CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait::async_trait]
impl ResponseGenerator for OpenAiChat {
    async fn respond(&self, history: &[ChatMessage], prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.request(history, prompt);

        debug!(model = %self.model, turns = history.len(), "Requesting chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Chat completion returned {}: {}", status, body);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("Invalid chat completion response")?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if reply.is_empty() {
            bail!("Chat completion returned no content");
        }

        info!(chars = reply.len(), "Chat completion received");
        Ok(reply)
    }
}
