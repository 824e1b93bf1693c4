use std::fmt;

use polars::prelude::DataFrame;

use super::SelectionError;
use crate::filters::FilterId;
use crate::table::{self, Record, TableError};

/// Rows taken from the table when building a request. The prompt itself
/// only shows [`super::prompt::SAMPLE_ROW_LIMIT`] of them.
pub const SAMPLE_ROWS: usize = 5;

/// One call to a text-completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub max_output_tokens: u32,
}

/// Text-completion service abstraction (allows mocking).
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError>;
}

impl<T: CompletionClient + ?Sized> CompletionClient for Box<T> {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError> {
        (**self).complete(request)
    }
}

/// What the selector sees of an uploaded table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionRequest {
    pub headers: Vec<String>,
    pub sample: Vec<Record>,
}

impl SelectionRequest {
    pub fn new(headers: Vec<String>, sample: Vec<Record>) -> Self {
        Self { headers, sample }
    }

    /// Headers plus the first `sample_rows` rows of `df`.
    pub fn from_table(df: &DataFrame, sample_rows: usize) -> Result<Self, TableError> {
        Ok(Self {
            headers: table::headers(df),
            sample: table::head_records(df, sample_rows)?,
        })
    }
}

/// Why the selector answered with every known filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The reply was an empty list.
    EmptyResponse,
    /// The reply listed only identifiers the registry does not know.
    NoKnownFilters,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmptyResponse => "the reply listed no filters",
            Self::NoKnownFilters => "the reply named no known filters",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStatus {
    /// Filters came straight from the model's reply.
    Suggested,
    /// The reply was usable but empty; all filters were selected.
    Fallback(FallbackReason),
    /// The service failed or the reply could not be parsed. No filters.
    Failed(SelectionError),
}

/// Validated, deduplicated filters in the order the model listed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    pub filters: Vec<FilterId>,
    pub status: SelectionStatus,
    /// Identifiers from the reply that the registry does not know.
    pub dropped: Vec<String>,
}

impl SelectionResult {
    pub fn suggested(filters: Vec<FilterId>, dropped: Vec<String>) -> Self {
        Self {
            filters,
            status: SelectionStatus::Suggested,
            dropped,
        }
    }

    pub fn fallback(filters: Vec<FilterId>, reason: FallbackReason, dropped: Vec<String>) -> Self {
        Self {
            filters,
            status: SelectionStatus::Fallback(reason),
            dropped,
        }
    }

    pub fn failed(error: SelectionError) -> Self {
        Self {
            filters: Vec::new(),
            status: SelectionStatus::Failed(error),
            dropped: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, SelectionStatus::Fallback(_))
    }

    pub fn error(&self) -> Option<&SelectionError> {
        match &self.status {
            SelectionStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Diagnostic events emitted while a selection runs, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent<'a> {
    PromptBuilt { prompt: &'a str },
    ResponseReceived { raw: &'a str },
    Fallback { reason: FallbackReason },
    Failed { error: &'a SelectionError },
}

/// Receives [`SelectionEvent`]s. Any matching closure is an observer.
pub trait SelectionObserver {
    fn on_event(&self, event: &SelectionEvent<'_>);
}

impl<F> SelectionObserver for F
where
    F: Fn(&SelectionEvent<'_>),
{
    fn on_event(&self, event: &SelectionEvent<'_>) {
        self(event)
    }
}
