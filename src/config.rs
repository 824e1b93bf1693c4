use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Filter Advisor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Default local Ollama instance.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Model asked for filter suggestions unless overridden.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Model used with the Ollama backend unless overridden.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Output budget for the suggestion reply, in tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 300;

/// Upper bound on a single completion call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> String {
    format!(
        "warn,{}=info",
        env!("CARGO_PKG_NAME").replace('-', "_")
    )
}

/// Settings for one filter selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Maximum tokens the service may produce for the reply.
    pub max_output_tokens: u32,
    /// Timeout applied by HTTP-backed completion clients.
    pub timeout_secs: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
