//! Attendance record model and related types.
//!
//! This module defines the [`AttendanceRecord`] struct and the
//! [`AttendanceStatus`] enum with its fixed weight table.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Smallest number of hours a single attendance record may carry.
pub const MIN_RECORD_HOURS: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Largest number of hours a single attendance record may carry.
pub const MAX_RECORD_HOURS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// The observed attendance status for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Attended on time.
    Present,
    /// Did not attend.
    Absent,
    /// Attended but arrived late.
    Late,
    /// Did not attend, with an accepted excuse.
    Excused,
}

impl_text_enum!(AttendanceStatus, "attendance status", {
    Present => "present",
    Absent => "absent",
    Late => "late",
    Excused => "excused",
});

impl AttendanceStatus {
    /// All statuses, in reporting order.
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
        AttendanceStatus::Absent,
    ];

    /// Returns the fixed weight of this status.
    ///
    /// present = 1.0, late = 0.75, excused = 0.5, absent = 0.0
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::AttendanceStatus;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(AttendanceStatus::Late.weight(), Decimal::new(75, 2));
    /// ```
    pub fn weight(self) -> Decimal {
        match self {
            AttendanceStatus::Present => Decimal::ONE,
            AttendanceStatus::Late => Decimal::new(75, 2),
            AttendanceStatus::Excused => Decimal::new(5, 1),
            AttendanceStatus::Absent => Decimal::ZERO,
        }
    }

    /// Returns true when the session's hours were actually delivered.
    ///
    /// Only present and late sessions earn teaching pay; excused and absent
    /// sessions do not, regardless of their weight.
    pub fn counts_as_taught(self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

/// One attendance observation for one assignment on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier for the record.
    pub id: i64,
    /// The teaching assignment this record belongs to.
    pub assignment_id: i64,
    /// The date of the session.
    pub date: NaiveDate,
    /// The observed status.
    pub status: AttendanceStatus,
    /// Hours attended or taught.
    pub hours: Decimal,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// The user who recorded the entry.
    pub recorded_by: i64,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Returns the weight of this record's status.
    pub fn attendance_factor(&self) -> Decimal {
        self.status.weight()
    }

    /// Returns the hours weighted by the status factor.
    pub fn weighted_hours(&self) -> Decimal {
        self.hours * self.status.weight()
    }
}

/// Data required to record a new attendance entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttendanceRecord {
    /// The teaching assignment the session belongs to.
    pub assignment_id: i64,
    /// The date of the session.
    pub date: NaiveDate,
    /// The observed status.
    pub status: AttendanceStatus,
    /// Hours attended or taught.
    pub hours: Decimal,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// The user recording the entry.
    pub recorded_by: i64,
}

impl NewAttendanceRecord {
    /// Checks that the hours fall inside the accepted per-record range.
    pub fn validate(&self) -> EngineResult<()> {
        if self.hours < MIN_RECORD_HOURS || self.hours > MAX_RECORD_HOURS {
            return Err(EngineError::validation(
                "hours",
                format!(
                    "{} is outside the accepted range {}-{}",
                    self.hours, MIN_RECORD_HOURS, MAX_RECORD_HOURS
                ),
            ));
        }
        if self
            .notes
            .as_ref()
            .is_some_and(|notes| notes.chars().count() > 500)
        {
            return Err(EngineError::validation(
                "notes",
                "must be at most 500 characters",
            ));
        }
        Ok(())
    }
}
