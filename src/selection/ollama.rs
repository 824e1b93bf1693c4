use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{CompletionClient, CompletionRequest};
use super::SelectionError;
use crate::config::DEFAULT_OLLAMA_URL;

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SelectionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SelectionError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default Ollama instance at localhost:11434.
    pub fn default_local(timeout_secs: u64) -> Result<Self, SelectionError> {
        Self::new(DEFAULT_OLLAMA_URL, timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_model_available(&self, model: &str) -> Result<bool, SelectionError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }

    pub fn list_models(&self) -> Result<Vec<String>, SelectionError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
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

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| SelectionError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

/// Map a reqwest send failure onto the selection taxonomy.
pub(crate) fn map_send_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> SelectionError {
    if e.is_timeout() {
        SelectionError::Timeout(timeout_secs)
    } else if e.is_connect() {
        SelectionError::Connection(base_url.to_string())
    } else {
        SelectionError::HttpClient(e.to_string())
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl CompletionClient for OllamaClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: request.model,
            prompt: request.prompt,
            stream: false,
            options: OllamaOptions {
                num_predict: request.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
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

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| SelectionError::ResponseParsing(e.to_string()))?;

        Ok(parsed.response)
    }
}

/// Mock completion client for testing — returns a configurable reply
/// and records every prompt it receives.
pub struct MockCompletionClient {
    reply: Result<String, SelectionError>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletionClient {
    pub fn new(response: &str) -> Self {
        Self {
            reply: Ok(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with `error`.
    pub fn failing(error: SelectionError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl CompletionClient for MockCompletionClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.to_string());
        }
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest<'static> {
        CompletionRequest {
            model: "model",
            prompt: "prompt",
            max_output_tokens: 300,
        }
    }

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockCompletionClient::new("[\"check_age_range\"]");
        assert_eq!(client.complete(&request()).unwrap(), "[\"check_age_range\"]");
    }

    #[test]
    fn mock_client_records_prompts() {
        let client = MockCompletionClient::new("[]");
        client.complete(&request()).unwrap();
        client.complete(&request()).unwrap();
        assert_eq!(client.prompts(), vec!["prompt", "prompt"]);
    }

    #[test]
    fn failing_mock_returns_error() {
        let client = MockCompletionClient::failing(SelectionError::Timeout(60));
        assert_eq!(client.complete(&request()), Err(SelectionError::Timeout(60)));
    }

    #[test]
    fn ollama_client_constructor() {
        let client = OllamaClient::new("http://localhost:11434", 120).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 120);
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 60).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn default_local_uses_standard_port() {
        let client = OllamaClient::default_local(60).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn generate_request_carries_output_budget() {
        let body = OllamaGenerateRequest {
            model: "llama3",
            prompt: "p",
            stream: false,
            options: OllamaOptions { num_predict: 250 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"]["num_predict"], 250);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn unreachable_server_is_connection_error() {
        // Port 9 (discard) is closed on loopback in test environments.
        let client = OllamaClient::new("http://127.0.0.1:9", 2).unwrap();
        let err = client.complete(&request()).unwrap_err();
        assert!(err.is_service_error());
    }
}
