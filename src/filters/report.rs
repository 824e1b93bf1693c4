use polars::prelude::DataFrame;

use super::registry::{FilterId, FilterRegistry};
use super::FilterError;

/// Outcome of running one filter over a table.
#[derive(Debug, Clone)]
pub struct FilterReport {
    pub id: FilterId,
    pub description: &'static str,
    pub violating_rows: DataFrame,
    pub passed: bool,
}

impl FilterReport {
    pub fn violation_count(&self) -> usize {
        self.violating_rows.height()
    }
}

/// Run a single registered filter over `table`.
pub fn apply_filter(
    registry: &FilterRegistry,
    id: FilterId,
    table: &DataFrame,
) -> Result<FilterReport, FilterError> {
    let descriptor = registry.get(id).ok_or(FilterError::NotRegistered(id))?;

    let violating_rows = descriptor.violations(table)?;
    let passed = violating_rows.height() == 0;

    tracing::debug!(
        filter = %id,
        violations = violating_rows.height(),
        passed,
        "Filter applied"
    );

    Ok(FilterReport {
        id,
        description: descriptor.description,
        violating_rows,
        passed,
    })
}

/// Run each selected filter in order. A failing filter does not stop the others.
pub fn apply_filters(
    registry: &FilterRegistry,
    ids: &[FilterId],
    table: &DataFrame,
) -> Vec<(FilterId, Result<FilterReport, FilterError>)> {
    ids.iter()
        .map(|&id| {
            let result = apply_filter(registry, id, table);
            if let Err(e) = &result {
                tracing::warn!(filter = %id, error = %e, "Filter could not be applied");
            }
            (id, result)
        })
        .collect()
}
