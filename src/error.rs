//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while aggregating attendance,
//! assembling payroll and persisting the results.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::PayrollStatus;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "payroll",
///     id: 42,
/// };
/// assert_eq!(error.to_string(), "payroll 42 not found");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A date range ended before it started.
    #[error("Invalid date range: end date {end} is before start date {start}")]
    InvalidDateRange {
        /// The start of the rejected range.
        start: NaiveDate,
        /// The end of the rejected range.
        end: NaiveDate,
    },

    /// An edit was attempted on a payroll that is no longer editable.
    #[error("Payroll {payroll_id} cannot be edited while {status}")]
    PayrollNotEditable {
        /// The payroll that was targeted.
        payroll_id: i64,
        /// The status that blocks the edit.
        status: PayrollStatus,
    },

    /// A lifecycle transition is not allowed from the current status.
    #[error("Payroll {payroll_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The payroll that was targeted.
        payroll_id: i64,
        /// The current status.
        from: PayrollStatus,
        /// The requested status.
        to: PayrollStatus,
    },

    /// Input data failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The kind of entity (e.g. "payroll", "assignment").
        entity: &'static str,
        /// The identifier that was looked up.
        id: i64,
    },

    /// The storage layer failed. Any open transaction has been rolled back.
    #[error("Persistence error: {message}")]
    Persistence {
        /// A description of the storage failure.
        message: String,
    },
}

impl EngineError {
    /// Creates a validation error for the given field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by invalid input or a disallowed edit.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidDateRange { .. }
                | EngineError::PayrollNotEditable { .. }
                | EngineError::InvalidTransition { .. }
                | EngineError::Validation { .. }
        )
    }

    /// Returns true when a referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Persistence {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for EngineError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        EngineError::Persistence {
            message: format!("migration failed: {err}"),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
