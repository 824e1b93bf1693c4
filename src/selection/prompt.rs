use serde_json::Value;

use super::sanitize::sanitize_cell;
use super::types::SelectionRequest;
use crate::filters::FilterRegistry;

/// Sample rows shown to the model.
pub const SAMPLE_ROW_LIMIT: usize = 3;

/// Build the filter-selection prompt. Pure: identical inputs give
/// byte-identical output.
pub fn build_selection_prompt(request: &SelectionRequest, registry: &FilterRegistry) -> String {
    let headers = Value::Array(
        request
            .headers
            .iter()
            .map(|h| Value::String(sanitize_cell(h)))
            .collect(),
    );

    let sample_rows: Vec<String> = request
        .sample
        .iter()
        .take(SAMPLE_ROW_LIMIT)
        .map(|record| {
            let cleaned = record
                .iter()
                .map(|(key, value)| (sanitize_cell(key), sanitize_value(value)))
                .collect();
            Value::Object(cleaned).to_string()
        })
        .collect();
    let sample = if sample_rows.is_empty() {
        "(no rows)".to_string()
    } else {
        sample_rows.join("\n")
    };

    let filters: Vec<String> = registry
        .descriptors()
        .map(|f| format!("- {}: {}", f.id, f.description))
        .collect();
    let filters = filters.join("\n");

    let example = Value::Array(
        registry
            .descriptors()
            .take(2)
            .map(|f| Value::String(f.id.to_string()))
            .collect(),
    );

    format!(
        r#"You are a data validation assistant. Your job is to select which data checks to run on an uploaded CSV file.

CSV headers: {headers}

Sample data (up to {SAMPLE_ROW_LIMIT} rows, one JSON record per line):
{sample}

Available validation filters and their descriptions:
{filters}

Based on the headers and sample data, reply with a list of the relevant filter names from the list above, e.g. {example}.
Reply with ONLY the list literal of quoted filter names. Do NOT include any explanation, code fences, or other text."#
    )
}

fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_cell(s)),
        other => other.clone(),
    }
}
