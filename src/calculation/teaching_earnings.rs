//! Teaching earnings calculation.
//!
//! Earnings accrue only for hours actually delivered: records marked
//! `present` or `late`. Excused and absent sessions earn nothing even though
//! the weighted attendance rate gives them partial credit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AssignmentStatus, AttendanceRecord, AuditStep, PayPeriod, TeachingAssignment};

use super::rounding::round_money;

/// Earnings for one active assignment over the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitEarnings {
    /// The assignment the earnings belong to.
    pub assignment_id: i64,
    /// Assignment title, for reporting.
    pub title: String,
    /// Assignment code, for reporting.
    pub code: Option<String>,
    /// Units (credits) of the assignment.
    pub unit_value: Decimal,
    /// Hours delivered in the period.
    pub hours_taught: Decimal,
    /// Rate paid per hour taught.
    pub rate_per_unit: Decimal,
    /// `hours_taught × rate_per_unit`, rounded to cents.
    pub earnings: Decimal,
}

/// Teaching earnings across an employee's active assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingEarnings {
    /// Per-assignment earnings, ordered by assignment id.
    pub units: Vec<UnitEarnings>,
    /// Sum of hours taught.
    pub total_hours: Decimal,
    /// Sum of unit earnings.
    pub total_earnings: Decimal,
}

/// The result of calculating teaching earnings, including the audit step.
#[derive(Debug, Clone)]
pub struct TeachingEarningsResult {
    /// The calculated earnings.
    pub earnings: TeachingEarnings,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates hours taught and earnings for each active assignment.
///
/// Assignments whose status is not `active` are skipped. Records outside
/// `period` or belonging to other assignments are ignored.
///
/// # Arguments
///
/// * `period` - The closed date window
/// * `assignments` - The employee's assignments
/// * `records` - Attendance records for those assignments
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_teaching_earnings;
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let period = PayPeriod::new(
///     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
/// )
/// .unwrap();
///
/// let result = calculate_teaching_earnings(&period, &[], &[], 1);
/// assert_eq!(result.earnings.total_earnings, Decimal::ZERO);
/// ```
pub fn calculate_teaching_earnings(
    period: &PayPeriod,
    assignments: &[TeachingAssignment],
    records: &[AttendanceRecord],
    step_number: u32,
) -> TeachingEarningsResult {
    let mut active: Vec<&TeachingAssignment> = assignments
        .iter()
        .filter(|assignment| assignment.status == AssignmentStatus::Active)
        .collect();
    active.sort_by_key(|assignment| assignment.id);

    let units: Vec<UnitEarnings> = active
        .iter()
        .map(|assignment| {
            let hours_taught: Decimal = records
                .iter()
                .filter(|record| {
                    record.assignment_id == assignment.id
                        && period.contains_date(record.date)
                        && record.status.counts_as_taught()
                })
                .map(|record| record.hours)
                .sum();

            UnitEarnings {
                assignment_id: assignment.id,
                title: assignment.title.clone(),
                code: assignment.code.clone(),
                unit_value: assignment.unit_value,
                hours_taught,
                rate_per_unit: assignment.rate_per_unit,
                earnings: round_money(hours_taught * assignment.rate_per_unit),
            }
        })
        .collect();

    let total_hours: Decimal = units.iter().map(|unit| unit.hours_taught).sum();
    let total_earnings: Decimal = units.iter().map(|unit| unit.earnings).sum();

    let breakdown: Vec<String> = units
        .iter()
        .map(|unit| {
            format!(
                "{}: {}h × ${} = ${}",
                unit.title,
                unit.hours_taught.normalize(),
                unit.rate_per_unit.normalize(),
                unit.earnings
            )
        })
        .collect();

    let reasoning = if units.is_empty() {
        "No active assignments in the period - no teaching earnings".to_string()
    } else {
        format!(
            "{} (present and late hours only); total ${}",
            breakdown.join("; "),
            total_earnings
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "teaching_earnings".to_string(),
        rule_name: "Teaching Earnings".to_string(),
        input: serde_json::json!({
            "period_start": period.start_date.to_string(),
            "period_end": period.end_date.to_string(),
            "active_assignments": units.len(),
            "skipped_assignments": assignments.len() - units.len()
        }),
        output: serde_json::json!({
            "total_hours": total_hours.normalize().to_string(),
            "total_earnings": total_earnings.to_string()
        }),
        reasoning,
    };

    TeachingEarningsResult {
        earnings: TeachingEarnings {
            units,
            total_hours,
            total_earnings,
        },
        audit_step,
    }
}
