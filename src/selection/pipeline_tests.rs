// End-to-end tests for the selection chain:
// table → request → prompt → mock completion → parse → validate → apply filters.

use std::sync::{Arc, Mutex};

use polars::prelude::*;

use super::ollama::MockCompletionClient;
use super::orchestrator::FilterSelector;
use super::types::{
    CompletionClient, CompletionRequest, FallbackReason, SelectionEvent, SelectionRequest,
    SelectionStatus, SAMPLE_ROWS,
};
use super::SelectionError;
use crate::config::SelectorConfig;
use crate::filters::{apply_filters, FilterId, FilterRegistry};

fn people() -> DataFrame {
    df!(
        "name" => ["Alice", "Bo", "Carol", "Dan", "Eve", "Fred"],
        "email" => [Some("alice@example.com"), None, Some("carol@example.com"), Some("dan@example.com"), None, Some("fred@example.com")],
        "age" => [34i64, -1, 121, 40, 29, 120]
    )
    .unwrap()
}

fn selector_with(client: impl CompletionClient + Send + Sync + 'static) -> FilterSelector {
    FilterSelector::new(
        Box::new(client),
        Arc::new(FilterRegistry::standard()),
        SelectorConfig::default(),
    )
}

/// Event kinds recorded by a test observer, with their text payloads.
fn recording_observer() -> (
    Arc<Mutex<Vec<String>>>,
    impl Fn(&SelectionEvent<'_>) + Send + Sync + 'static,
) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let observer = move |event: &SelectionEvent<'_>| {
        let entry = match event {
            SelectionEvent::PromptBuilt { .. } => "prompt".to_string(),
            SelectionEvent::ResponseReceived { raw } => format!("raw:{raw}"),
            SelectionEvent::Fallback { reason } => format!("fallback:{reason:?}"),
            SelectionEvent::Failed { .. } => "failed".to_string(),
        };
        sink.lock().unwrap().push(entry);
    };
    (log, observer)
}

/// Client that answers based on which columns the prompt mentions.
struct HeaderAwareClient;

impl CompletionClient for HeaderAwareClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError> {
        let mut picks = Vec::new();
        if request.prompt.contains(r#""email""#) {
            picks.push("\"check_missing_emails\"");
        }
        if request.prompt.contains(r#""age""#) {
            picks.push("\"check_age_range\"");
        }
        Ok(format!("[{}]", picks.join(", ")))
    }
}

#[test]
fn full_chain_reports_violations() {
    let table = people();
    let request = SelectionRequest::from_table(&table, SAMPLE_ROWS).unwrap();
    let selector = selector_with(MockCompletionClient::new(
        r#"["check_missing_emails", "check_age_range"]"#,
    ));

    let selection = selector.select(&request);
    assert_eq!(selection.status, SelectionStatus::Suggested);

    let registry = FilterRegistry::standard();
    let reports = apply_filters(&registry, &selection.filters, &table);
    assert_eq!(reports.len(), 2);

    let emails = reports[0].1.as_ref().unwrap();
    assert_eq!(emails.id, FilterId::CheckMissingEmails);
    assert_eq!(emails.violation_count(), 2);
    assert!(!emails.passed);

    let ages = reports[1].1.as_ref().unwrap();
    assert_eq!(ages.id, FilterId::CheckAgeRange);
    assert_eq!(ages.violation_count(), 2);
}

#[test]
fn prompt_sent_to_service_shows_three_rows() {
    let client = Arc::new(MockCompletionClient::new("[]"));

    struct Shared(Arc<MockCompletionClient>);
    impl CompletionClient for Shared {
        fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SelectionError> {
            self.0.complete(request)
        }
    }

    let selector = selector_with(Shared(Arc::clone(&client)));
    let request = SelectionRequest::from_table(&people(), SAMPLE_ROWS).unwrap();
    selector.select(&request);

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Alice"));
    assert!(prompts[0].contains("Carol"));
    assert!(!prompts[0].contains("Dan"));
}

#[test]
fn observer_sees_prompt_then_reply() {
    let (log, observer) = recording_observer();
    let selector = selector_with(MockCompletionClient::new(r#"["flag_short_names"]"#))
        .with_observer(observer);

    selector.select(&SelectionRequest::from_table(&people(), SAMPLE_ROWS).unwrap());

    let log = log.lock().unwrap();
    assert_eq!(*log, vec!["prompt", r#"raw:["flag_short_names"]"#]);
}

#[test]
fn observer_is_told_about_fallback() {
    let (log, observer) = recording_observer();
    let selector = selector_with(MockCompletionClient::new("[]")).with_observer(observer);

    let result = selector.select(&SelectionRequest::from_table(&people(), SAMPLE_ROWS).unwrap());

    assert_eq!(result.filters, FilterRegistry::standard().all_ids());
    let log = log.lock().unwrap();
    assert_eq!(*log, vec!["prompt", "raw:[]", "fallback:EmptyResponse"]);
}

#[test]
fn observer_is_told_about_parse_failure() {
    let (log, observer) = recording_observer();
    let selector = selector_with(MockCompletionClient::new("Check the emails."))
        .with_observer(observer);

    let result = selector.select(&SelectionRequest::default());

    assert!(result.filters.is_empty());
    let log = log.lock().unwrap();
    assert_eq!(*log, vec!["prompt", "raw:Check the emails.", "failed"]);
}

#[test]
fn service_failure_skips_reply_event() {
    let (log, observer) = recording_observer();
    let selector = selector_with(MockCompletionClient::failing(SelectionError::Connection(
        "http://localhost:11434".into(),
    )))
    .with_observer(observer);

    let result = selector.select(&SelectionRequest::default());

    assert!(matches!(
        result.status,
        SelectionStatus::Failed(SelectionError::Connection(_))
    ));
    assert_eq!(*log.lock().unwrap(), vec!["prompt", "failed"]);
}

#[test]
fn unknown_only_reply_reports_reason() {
    let selector = selector_with(MockCompletionClient::new("['validate_phone']"));
    let result = selector.select(&SelectionRequest::default());
    assert_eq!(
        result.status,
        SelectionStatus::Fallback(FallbackReason::NoKnownFilters)
    );
    assert_eq!(result.dropped, vec!["validate_phone"]);
}

#[test]
fn concurrent_selections_do_not_interfere() {
    let registry = Arc::new(FilterRegistry::standard());
    let selector = FilterSelector::new(
        Box::new(HeaderAwareClient),
        Arc::clone(&registry),
        SelectorConfig::default(),
    );

    let with_email = df!("email" => [Some("a@example.com"), None]).unwrap();
    let with_age = df!("age" => [10i64, 130]).unwrap();
    let email_request = SelectionRequest::from_table(&with_email, SAMPLE_ROWS).unwrap();
    let age_request = SelectionRequest::from_table(&with_age, SAMPLE_ROWS).unwrap();

    let (emails, ages) = std::thread::scope(|s| {
        let a = s.spawn(|| {
            (0..20)
                .map(|_| selector.select(&email_request).filters)
                .collect::<Vec<_>>()
        });
        let b = s.spawn(|| {
            (0..20)
                .map(|_| selector.select(&age_request).filters)
                .collect::<Vec<_>>()
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    assert!(emails.iter().all(|f| *f == vec![FilterId::CheckMissingEmails]));
    assert!(ages.iter().all(|f| *f == vec![FilterId::CheckAgeRange]));
    assert_eq!(registry.all_ids(), FilterRegistry::standard().all_ids());
}
