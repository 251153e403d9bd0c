//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

/// Implements `as_str`, `Display` and `FromStr` for a stored text enum.
macro_rules! impl_text_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the stored text form.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::error::EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(crate::error::EngineError::validation(
                        $field,
                        format!("unknown value '{other}'"),
                    )),
                }
            }
        }
    };
}

mod attendance;
mod audit;
mod employee;
mod pay_period;
mod payroll;
mod salary;
mod teaching_assignment;

pub use attendance::{
    AttendanceRecord, AttendanceStatus, MAX_RECORD_HOURS, MIN_RECORD_HOURS, NewAttendanceRecord,
};
pub use audit::{AuditStep, AuditTrace, AuditWarning, WarningSeverity};
pub use employee::Employee;
pub use pay_period::PayPeriod;
pub use payroll::{
    DeductionType, EarningsBasis, NewDeduction, NewUnitLine, PaymentMethod, PayrollDeductionLine,
    PayrollDetail, PayrollRecord, PayrollStatus, PayrollUnitLine,
};
pub use salary::{
    ContractType, DAYS_PER_YEAR, FULL_TIME_HOURS_PER_YEAR, NewSalaryRecord,
    PART_TIME_HOURS_PER_YEAR, SalaryRecord, SalaryType, academic_year_for,
};
pub use teaching_assignment::{
    AssignmentRelationship, AssignmentStatus, NewTeachingAssignment, RelationshipType,
    TeachingAssignment,
};
