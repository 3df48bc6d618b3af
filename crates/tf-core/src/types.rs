//! Core type definitions with validation.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The provided identifier contained whitespace or control characters.
    #[error("{field} is malformed: {value:?}")]
    Malformed { field: &'static str, value: String },

    /// A task title was shorter than the minimum length.
    #[error("title must be at least {min} characters long")]
    TitleTooShort { min: usize },

    /// A due date was set before today.
    #[error("due date {due} cannot be in the past (today is {today})")]
    DueDateInPast { due: NaiveDate, today: NaiveDate },

    /// Unknown task status value.
    #[error("invalid task status: {value}")]
    InvalidStatus { value: String },

    /// Unknown task priority value.
    #[error("invalid task priority: {value}")]
    InvalidPriority { value: String },

    /// Unknown date range value.
    #[error("invalid date range: {value} (expected all, week, month or quarter)")]
    InvalidDateRange { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
                    return Err(ValidationError::Malformed {
                        field: $field_name,
                        value: id,
                    });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated task identifier.
    ///
    /// Task IDs are opaque, non-empty and free of whitespace. Whether the task
    /// exists is checked by the store.
    TaskId, "task ID"
);

define_string_id!(
    /// A validated project identifier.
    ProjectId, "project ID"
);

define_string_id!(
    /// Identifier of a persisted time interval, returned by the time log when
    /// an interval is opened and needed later to close it.
    IntervalId, "interval ID"
);
