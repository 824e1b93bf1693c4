use std::fmt;
use std::str::FromStr;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use super::checks::{check_age_range, check_missing_emails, flag_short_names};
use super::FilterError;

/// Identifier of a known validation filter.
///
/// The string forms are what the model sees in the prompt and is expected
/// to echo back, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterId {
    CheckMissingEmails,
    FlagShortNames,
    CheckAgeRange,
}

impl FilterId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckMissingEmails => "check_missing_emails",
            Self::FlagShortNames => "flag_short_names",
            Self::CheckAgeRange => "check_age_range",
        }
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilterId(pub String);

impl fmt::Display for UnknownFilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter id '{}'", self.0)
    }
}

impl std::error::Error for UnknownFilterId {}

impl FromStr for FilterId {
    type Err = UnknownFilterId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check_missing_emails" => Ok(Self::CheckMissingEmails),
            "flag_short_names" => Ok(Self::FlagShortNames),
            "check_age_range" => Ok(Self::CheckAgeRange),
            other => Err(UnknownFilterId(other.to_string())),
        }
    }
}

/// Maps a table to the subset of its rows that violate a check.
pub type FilterPredicate = fn(&DataFrame) -> Result<DataFrame, FilterError>;

/// A registered filter: identifier, human-readable description, predicate.
#[derive(Clone)]
pub struct FilterDescriptor {
    pub id: FilterId,
    pub description: &'static str,
    pub predicate: FilterPredicate,
}

impl FilterDescriptor {
    /// Run the predicate, returning the violating rows.
    pub fn violations(&self, table: &DataFrame) -> Result<DataFrame, FilterError> {
        (self.predicate)(table)
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered catalog of known filters. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: Vec<FilterDescriptor>,
}

impl FilterRegistry {
    /// Build a registry from explicit descriptors. Later duplicates of an id are ignored.
    pub fn new(descriptors: Vec<FilterDescriptor>) -> Self {
        let mut filters: Vec<FilterDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if filters.iter().all(|f| f.id != descriptor.id) {
                filters.push(descriptor);
            }
        }
        Self { filters }
    }

    /// The three canonical filters, in their canonical order.
    pub fn standard() -> Self {
        Self {
            filters: vec![
                FilterDescriptor {
                    id: FilterId::CheckMissingEmails,
                    description: "Check for missing emails",
                    predicate: check_missing_emails,
                },
                FilterDescriptor {
                    id: FilterId::FlagShortNames,
                    description: "Flag names that are too short",
                    predicate: flag_short_names,
                },
                FilterDescriptor {
                    id: FilterId::CheckAgeRange,
                    description: "Check for unrealistic ages",
                    predicate: check_age_range,
                },
            ],
        }
    }

    /// Look up a filter by its string identifier. Unknown ids yield `None`.
    pub fn lookup(&self, id: &str) -> Option<&FilterDescriptor> {
        self.filters.iter().find(|f| f.id.as_str() == id)
    }

    pub fn get(&self, id: FilterId) -> Option<&FilterDescriptor> {
        self.filters.iter().find(|f| f.id == id)
    }

    /// Every registered id, in registry order.
    pub fn all_ids(&self) -> Vec<FilterId> {
        self.filters.iter().map(|f| f.id).collect()
    }

    pub fn describe(&self, id: &str) -> Option<&'static str> {
        self.lookup(id).map(|f| f.description)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FilterDescriptor> {
        self.filters.iter()
    }
}
