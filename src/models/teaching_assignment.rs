//! Teaching assignment model and related types.
//!
//! A teaching assignment is an employee's teaching obligation for an academic
//! term. Assignments can be linked to each other through typed edges
//! ([`AssignmentRelationship`]).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::PayPeriod;

/// Lifecycle status of a teaching assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// The assignment has not started yet.
    Pending,
    /// The assignment is running.
    Active,
    /// The assignment has ended.
    Completed,
    /// The assignment was cancelled manually. Never overwritten by date derivation.
    Cancelled,
}

impl_text_enum!(AssignmentStatus, "assignment status", {
    Pending => "pending",
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl AssignmentStatus {
    /// The date-derived status of a `[start, end]` window on `today`.
    pub fn for_dates(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> AssignmentStatus {
        if today < start {
            AssignmentStatus::Pending
        } else if today <= end {
            AssignmentStatus::Active
        } else {
            AssignmentStatus::Completed
        }
    }
}

/// The kind of link between two assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// The target must be taught before the source.
    Prerequisite,
    /// The target is taught alongside the source.
    Corequisite,
    /// A loose association.
    Related,
}

impl_text_enum!(RelationshipType, "relationship type", {
    Prerequisite => "prerequisite",
    Corequisite => "corequisite",
    Related => "related",
});

/// A directed, typed edge between two assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRelationship {
    /// The assignment the edge starts from.
    pub source_id: i64,
    /// The assignment the edge points to.
    pub target_id: i64,
    /// The kind of relationship.
    pub relationship_type: RelationshipType,
    /// When the edge was created.
    pub created_at: DateTime<Utc>,
}

/// An employee's teaching obligation for an academic term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingAssignment {
    /// Unique identifier for the assignment.
    pub id: i64,
    /// The employee who teaches the assignment.
    pub employee_id: i64,
    /// Course title.
    pub title: String,
    /// Optional course code.
    #[serde(default)]
    pub code: Option<String>,
    /// The academic term, e.g. "2025 Spring".
    pub academic_term: String,
    /// First teaching day (inclusive).
    pub start_date: NaiveDate,
    /// Last teaching day (inclusive).
    pub end_date: NaiveDate,
    /// Scheduled contact hours per week.
    pub hours_per_week: Decimal,
    /// Academic units (credits).
    pub unit_value: Decimal,
    /// Payment rate per unit.
    pub rate_per_unit: Decimal,
    /// Stored lifecycle status.
    pub status: AssignmentStatus,
    /// The user who created the assignment.
    pub created_by: i64,
    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
    /// When the assignment was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TeachingAssignment {
    /// Returns the assignment's teaching window.
    pub fn period(&self) -> PayPeriod {
        PayPeriod {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Derives the status the assignment should have on `today`.
    ///
    /// A cancelled assignment stays cancelled.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{AssignmentStatus, TeachingAssignment};
    /// use chrono::{NaiveDate, Utc};
    /// use rust_decimal::Decimal;
    ///
    /// let assignment = TeachingAssignment {
    ///     id: 1,
    ///     employee_id: 10,
    ///     title: "Algebra I".to_string(),
    ///     code: Some("MATH101".to_string()),
    ///     academic_term: "2025 Spring".to_string(),
    ///     start_date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
    ///     end_date: NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(),
    ///     hours_per_week: Decimal::new(3, 0),
    ///     unit_value: Decimal::new(3, 0),
    ///     rate_per_unit: Decimal::new(45, 0),
    ///     status: AssignmentStatus::Pending,
    ///     created_by: 1,
    ///     created_at: Utc::now(),
    ///     updated_at: Utc::now(),
    /// };
    /// let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    /// assert_eq!(assignment.derive_status(today), AssignmentStatus::Active);
    /// ```
    pub fn derive_status(&self, today: NaiveDate) -> AssignmentStatus {
        if self.status == AssignmentStatus::Cancelled {
            AssignmentStatus::Cancelled
        } else {
            AssignmentStatus::for_dates(self.start_date, self.end_date, today)
        }
    }

    /// Length of the assignment in whole weeks, never less than one.
    ///
    /// Fractional weeks round half to even.
    pub fn duration_weeks(&self) -> i64 {
        let days = Decimal::from((self.end_date - self.start_date).num_days());
        let weeks = (days / Decimal::from(7))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        weeks.to_i64().unwrap_or(1).max(1)
    }

    /// Scheduled contact hours over the whole assignment.
    pub fn total_hours(&self) -> Decimal {
        Decimal::from(self.duration_weeks()) * self.hours_per_week
    }

    /// Full payment for the assignment before any attendance adjustment.
    pub fn total_payment(&self) -> Decimal {
        self.unit_value * self.rate_per_unit
    }
}

/// Data required to create a teaching assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeachingAssignment {
    /// The employee who teaches the assignment.
    pub employee_id: i64,
    /// Course title.
    pub title: String,
    /// Optional course code.
    #[serde(default)]
    pub code: Option<String>,
    /// The academic term.
    pub academic_term: String,
    /// First teaching day.
    pub start_date: NaiveDate,
    /// Last teaching day.
    pub end_date: NaiveDate,
    /// Scheduled contact hours per week.
    pub hours_per_week: Decimal,
    /// Academic units (credits).
    pub unit_value: Decimal,
    /// Payment rate per unit.
    pub rate_per_unit: Decimal,
    /// Initial status; `None` derives it from the dates.
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
    /// The user creating the assignment.
    pub created_by: i64,
}

impl NewTeachingAssignment {
    /// Validates dates, text fields and numeric fields.
    pub fn validate(&self) -> EngineResult<()> {
        PayPeriod::new(self.start_date, self.end_date)?;

        if self.title.trim().is_empty() || self.title.chars().count() > 100 {
            return Err(EngineError::validation(
                "title",
                "must be between 1 and 100 characters",
            ));
        }

        for (field, value) in [
            ("hours_per_week", self.hours_per_week),
            ("unit_value", self.unit_value),
            ("rate_per_unit", self.rate_per_unit),
        ] {
            if value < Decimal::ZERO {
                return Err(EngineError::validation(field, "must not be negative"));
            }
        }
        Ok(())
    }
}
