use std::sync::Arc;

use uuid::Uuid;

use super::parser::parse_filter_list;
use super::prompt::build_selection_prompt;
use super::sanitize::normalize_response;
use super::types::{
    CompletionClient, CompletionRequest, FallbackReason, SelectionEvent, SelectionObserver,
    SelectionRequest, SelectionResult,
};
use crate::config::SelectorConfig;
use crate::filters::{FilterId, FilterRegistry};

/// Asks a completion service which registered filters apply to a table:
/// prompt → completion → normalize → parse → validate → fallback.
///
/// Single shot per call; every failure is absorbed into the returned
/// [`SelectionResult`]. Holds no mutable state, so one selector can serve
/// concurrent callers.
pub struct FilterSelector {
    client: Box<dyn CompletionClient + Send + Sync>,
    registry: Arc<FilterRegistry>,
    config: SelectorConfig,
    observer: Option<Box<dyn SelectionObserver + Send + Sync>>,
}

impl FilterSelector {
    pub fn new(
        client: Box<dyn CompletionClient + Send + Sync>,
        registry: Arc<FilterRegistry>,
        config: SelectorConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
            observer: None,
        }
    }

    /// Attach a diagnostic hook that sees the prompt, the raw reply, and
    /// fallback/failure notices.
    pub fn with_observer(mut self, observer: impl SelectionObserver + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn select(&self, request: &SelectionRequest) -> SelectionResult {
        let selection_id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "select_filters",
            selection_id = %selection_id,
            model = %self.config.model,
            columns = request.headers.len(),
        )
        .entered();

        let prompt = build_selection_prompt(request, &self.registry);
        self.emit(&SelectionEvent::PromptBuilt { prompt: &prompt });

        let completion = CompletionRequest {
            model: &self.config.model,
            prompt: &prompt,
            max_output_tokens: self.config.max_output_tokens,
        };

        let raw = match self.client.complete(&completion) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Completion call failed");
                self.emit(&SelectionEvent::Failed { error: &e });
                return SelectionResult::failed(e);
            }
        };
        self.emit(&SelectionEvent::ResponseReceived { raw: &raw });

        let normalized = normalize_response(&raw);
        if normalized.is_empty() {
            return self.fall_back(FallbackReason::EmptyResponse, Vec::new());
        }

        let names = match parse_filter_list(&normalized) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, reply_len = raw.len(), "Reply is not a filter list");
                self.emit(&SelectionEvent::Failed { error: &e });
                return SelectionResult::failed(e);
            }
        };

        if names.is_empty() {
            return self.fall_back(FallbackReason::EmptyResponse, Vec::new());
        }

        let (filters, dropped) = self.validate(names);
        if !dropped.is_empty() {
            tracing::debug!(dropped = ?dropped, "Dropped unknown filter names");
        }

        if filters.is_empty() {
            return self.fall_back(FallbackReason::NoKnownFilters, dropped);
        }

        tracing::info!(filters = filters.len(), "Filters selected");
        SelectionResult::suggested(filters, dropped)
    }

    /// Keep registered names, first occurrence only, in reply order.
    fn validate(&self, names: Vec<String>) -> (Vec<FilterId>, Vec<String>) {
        let mut filters: Vec<FilterId> = Vec::new();
        let mut dropped = Vec::new();

        for name in names {
            match self.registry.lookup(&name) {
                Some(descriptor) => {
                    if !filters.contains(&descriptor.id) {
                        filters.push(descriptor.id);
                    }
                }
                None => dropped.push(name),
            }
        }

        (filters, dropped)
    }

    fn fall_back(&self, reason: FallbackReason, dropped: Vec<String>) -> SelectionResult {
        tracing::info!(reason = ?reason, "No usable filters suggested, selecting all");
        self.emit(&SelectionEvent::Fallback { reason });
        SelectionResult::fallback(self.registry.all_ids(), reason, dropped)
    }

    fn emit(&self, event: &SelectionEvent<'_>) {
        if let Some(observer) = &self.observer {
            observer.on_event(event);
        }
    }
}
