//! Filter Advisor CLI.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use filter_advisor::config::{
    SelectorConfig, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_OLLAMA_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
use filter_advisor::filters::{apply_filters, FilterRegistry};
use filter_advisor::selection::{
    CompletionClient, FilterSelector, OllamaClient, OpenAiClient, SelectionEvent,
    SelectionRequest, SelectionStatus, SAMPLE_ROWS,
};
use filter_advisor::table;

/// Rows shown in the data preview.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// OpenAI-compatible chat completions
    Openai,
    /// Local Ollama instance
    Ollama,
}

#[derive(Debug, Parser)]
#[command(name = "filter-advisor", version, about = "Suggest and run validation checks for a CSV file")]
struct Cli {
    /// CSV file to validate.
    csv: PathBuf,

    /// Completion service to ask for filter suggestions.
    #[arg(long, value_enum, default_value_t = Backend::Openai)]
    backend: Backend,

    /// Service base URL (defaults to the backend's standard endpoint).
    #[arg(long)]
    base_url: Option<String>,

    /// Model name (defaults to gpt-4 for openai, llama3 for ollama).
    #[arg(long)]
    model: Option<String>,

    /// Maximum tokens in the model's reply.
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
    max_tokens: u32,

    /// Timeout for the completion call, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// API key for the openai backend.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Print the prompt sent and the raw reply received.
    #[arg(long)]
    show_prompt: bool,
}

impl Cli {
    fn selector_config(&self) -> SelectorConfig {
        let default_model = match self.backend {
            Backend::Openai => DEFAULT_MODEL,
            Backend::Ollama => DEFAULT_OLLAMA_MODEL,
        };
        SelectorConfig {
            model: self.model.clone().unwrap_or_else(|| default_model.to_string()),
            max_output_tokens: self.max_tokens,
            timeout_secs: self.timeout_secs,
        }
    }
}

fn main() -> ExitCode {
    filter_advisor::init_logging();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` when a selection was made and every selected filter ran.
fn run(cli: &Cli) -> Result<bool> {
    let df = table::read_csv(&cli.csv)
        .with_context(|| format!("loading {}", cli.csv.display()))?;

    println!("Preview of uploaded data:");
    println!("{}", df.head(Some(PREVIEW_ROWS)));

    let config = cli.selector_config();
    let client = build_client(cli, &config)?;
    let registry = Arc::new(FilterRegistry::standard());

    let mut selector = FilterSelector::new(client, Arc::clone(&registry), config);
    if cli.show_prompt {
        selector = selector.with_observer(print_diagnostics);
    }

    let request = SelectionRequest::from_table(&df, SAMPLE_ROWS)?;
    let selection = selector.select(&request);

    println!();
    println!("Suggested filters:");
    match &selection.status {
        SelectionStatus::Suggested => {}
        SelectionStatus::Fallback(reason) => {
            println!("  ({reason}; running all filters)");
        }
        SelectionStatus::Failed(e) => {
            println!("  error: could not get filter suggestions: {e}");
            return Ok(false);
        }
    }
    for id in &selection.filters {
        println!("  - {id}");
    }
    if !selection.dropped.is_empty() {
        println!("  ignored unknown names: {}", selection.dropped.join(", "));
    }

    let mut all_ran = true;
    for (id, outcome) in apply_filters(&registry, &selection.filters, &df) {
        println!();
        println!("Results for: {id}");
        match outcome {
            Ok(report) if report.passed => println!("No issues found for this check."),
            Ok(report) => {
                println!("{} ({} rows)", report.description, report.violation_count());
                println!("{}", report.violating_rows);
            }
            Err(e) => {
                all_ran = false;
                println!("Could not run this check: {e}");
            }
        }
    }

    Ok(all_ran)
}

fn build_client(
    cli: &Cli,
    config: &SelectorConfig,
) -> Result<Box<dyn CompletionClient + Send + Sync>> {
    match cli.backend {
        Backend::Openai => {
            let api_key = cli.api_key.as_deref().unwrap_or_default();
            let client = match cli.base_url.as_deref() {
                Some(base_url) => OpenAiClient::new(base_url, api_key, config.timeout_secs),
                None => OpenAiClient::hosted(api_key, config.timeout_secs),
            }
            .context("set OPENAI_API_KEY or pass --api-key")?;
            tracing::info!(base_url = client.base_url(), "Using OpenAI backend");
            Ok(Box::new(client))
        }
        Backend::Ollama => {
            let client = match cli.base_url.as_deref() {
                Some(base_url) => OllamaClient::new(base_url, config.timeout_secs)?,
                None => OllamaClient::default_local(config.timeout_secs)?,
            };
            tracing::info!(base_url = client.base_url(), "Using Ollama backend");
            match client.is_model_available(&config.model) {
                Ok(true) => {}
                Ok(false) => tracing::warn!(model = %config.model, "Model not installed in Ollama"),
                Err(e) => tracing::warn!(error = %e, "Could not list Ollama models"),
            }
            Ok(Box::new(client))
        }
    }
}

fn print_diagnostics(event: &SelectionEvent<'_>) {
    match event {
        SelectionEvent::PromptBuilt { prompt } => {
            println!("--- Prompt sent ---");
            println!("{prompt}");
        }
        SelectionEvent::ResponseReceived { raw } => {
            println!("--- Raw reply ---");
            println!("{raw}");
        }
        SelectionEvent::Fallback { .. } | SelectionEvent::Failed { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["filter-advisor", "people.csv"]).unwrap();
        assert_eq!(cli.backend, Backend::Openai);
        let config = cli.selector_config();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.max_output_tokens, 300);
    }

    #[test]
    fn ollama_backend_uses_local_model() {
        let cli =
            Cli::try_parse_from(["filter-advisor", "people.csv", "--backend", "ollama"]).unwrap();
        assert_eq!(cli.selector_config().model, "llama3");
    }

    #[test]
    fn explicit_model_wins() {
        let cli = Cli::try_parse_from([
            "filter-advisor",
            "people.csv",
            "--model",
            "gpt-4o-mini",
            "--max-tokens",
            "200",
        ])
        .unwrap();
        let config = cli.selector_config();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_output_tokens, 200);
    }

    #[test]
    fn csv_path_is_required() {
        assert!(Cli::try_parse_from(["filter-advisor"]).is_err());
    }
}
