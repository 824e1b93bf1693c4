use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ollama::map_send_error;
use super::types::{CompletionClient, CompletionRequest};
use super::SelectionError;
use crate::config::DEFAULT_OPENAI_URL;

/// Client for OpenAI-compatible chat-completion endpoints.
///
/// The prompt is sent as a single user message; the first choice's content
/// is the reply.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, SelectionError> {
        if api_key.trim().is_empty() {
            return Err(SelectionError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SelectionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            client,
            timeout_secs,
        })
    }

    /// Client for the public OpenAI API.
    pub fn hosted(api_key: &str, timeout_secs: u64) -> Result<Self, SelectionError> {
        Self::new(DEFAULT_OPENAI_URL, api_key, timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: request.model,
            messages: [ChatMessage {
                role: "user",
                content: request.prompt,
            }],
            max_tokens: request.max_output_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| map_send_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SelectionError::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| SelectionError::ResponseParsing(e.to_string()))?;

        first_choice_content(parsed)
    }
}

fn first_choice_content(response: ChatCompletionResponse) -> Result<String, SelectionError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| SelectionError::ResponseParsing("response has no choices".into()))
}
