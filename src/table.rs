//! Table loading and sampling.
//!
//! Loads a CSV into a polars `DataFrame` and turns its first rows into
//! JSON records for the selection prompt.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// One row as an ordered column-name → value map.
pub type Record = Map<String, Value>;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Failed to read CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Cell texts read as missing values, in addition to empty fields.
pub const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Read a CSV file with a single header row.
///
/// Empty fields and any of [`MISSING_MARKERS`] become null.
pub fn read_csv(path: &Path) -> Result<DataFrame, TableError> {
    let csv_error = |e: PolarsError| TableError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .map_parse_options(|options| {
            options.with_null_values(Some(NullValues::AllColumns(
                MISSING_MARKERS.iter().map(|marker| (*marker).into()).collect(),
            )))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(csv_error)?
        .finish()
        .map_err(csv_error)?;

    tracing::info!(
        rows = df.height(),
        columns = df.width(),
        "CSV loaded"
    );
    Ok(df)
}

/// Column names in table order.
pub fn headers(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// The first `n` rows as records, keys in column order.
pub fn head_records(df: &DataFrame, n: usize) -> Result<Vec<Record>, TableError> {
    let rows = n.min(df.height());
    let columns = df.get_columns();
    let mut records = Vec::with_capacity(rows);

    for row in 0..rows {
        let mut record = Map::with_capacity(columns.len());
        for column in columns {
            let value = any_to_json(column.get(row)?);
            record.insert(column.name().to_string(), value);
        }
        records.push(record);
    }

    Ok(records)
}

/// Convert a polars cell to JSON. Nulls and NaN become `null`.
pub fn any_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(f64::from(v)),
        AnyValue::Float64(v) => float_to_json(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}
