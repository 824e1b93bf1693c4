pub mod types;
pub mod prompt;
pub mod sanitize;
pub mod parser;
pub mod ollama;
pub mod openai;
pub mod orchestrator;

#[cfg(test)]
mod pipeline_tests;

pub use types::*;
pub use prompt::*;
pub use sanitize::*;
pub use parser::*;
pub use ollama::*;
pub use openai::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Completion service is not reachable at {0}")]
    Connection(String),

    #[error("Completion request timed out after {0}s")]
    Timeout(u64),

    #[error("Completion service returned error (status {status}): {body}")]
    ServiceStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Reply is not a list of filter names: {0}")]
    MalformedResponse(String),

    #[error("No API key configured for the completion service")]
    MissingApiKey,
}

impl SelectionError {
    /// True when the failure came from reaching the service rather than
    /// from interpreting its reply.
    pub fn is_service_error(&self) -> bool {
        !matches!(self, Self::MalformedResponse(_))
    }
}
