pub mod registry;
pub mod checks;
pub mod report;

pub use registry::*;
pub use checks::*;
pub use report::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Column '{column}' is required by this check but is not in the table")]
    MissingColumn { column: &'static str },

    #[error("Filter '{0}' is not registered")]
    NotRegistered(FilterId),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
