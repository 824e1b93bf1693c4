use polars::prelude::*;

use super::FilterError;

pub const EMAIL_COLUMN: &str = "email";
pub const NAME_COLUMN: &str = "name";
pub const AGE_COLUMN: &str = "age";

/// Names with fewer characters than this are flagged.
pub const SHORT_NAME_THRESHOLD: u32 = 3;

/// Inclusive bounds of a plausible age.
pub const MIN_AGE: f64 = 0.0;
pub const MAX_AGE: f64 = 120.0;

fn require_column(table: &DataFrame, column: &'static str) -> Result<(), FilterError> {
    match table.get_column_index(column) {
        Some(_) => Ok(()),
        None => Err(FilterError::MissingColumn { column }),
    }
}

fn rows_matching(table: &DataFrame, predicate: Expr) -> Result<DataFrame, FilterError> {
    Ok(table.clone().lazy().filter(predicate).collect()?)
}

/// Rows whose `email` is null.
pub fn check_missing_emails(table: &DataFrame) -> Result<DataFrame, FilterError> {
    require_column(table, EMAIL_COLUMN)?;
    rows_matching(table, col(EMAIL_COLUMN).is_null())
}

/// Rows whose `name` has fewer than [`SHORT_NAME_THRESHOLD`] characters.
///
/// Length counts Unicode scalar values, not bytes. Null names are not flagged.
pub fn flag_short_names(table: &DataFrame) -> Result<DataFrame, FilterError> {
    require_column(table, NAME_COLUMN)?;
    let length = col(NAME_COLUMN)
        .cast(DataType::String)
        .str()
        .len_chars();
    rows_matching(table, length.lt(lit(SHORT_NAME_THRESHOLD)))
}

/// Rows whose `age` is below [`MIN_AGE`] or above [`MAX_AGE`].
///
/// Values that are null, NaN or not numeric are not flagged.
pub fn check_age_range(table: &DataFrame) -> Result<DataFrame, FilterError> {
    require_column(table, AGE_COLUMN)?;
    let age = col(AGE_COLUMN).cast(DataType::Float64);
    // Float ordering puts NaN above every number.
    let out_of_range = age.clone().lt(lit(MIN_AGE)).or(age.clone().gt(lit(MAX_AGE)));
    rows_matching(table, out_of_range.and(age.is_not_nan()))
}
