//! Weighted attendance.
//!
//! Applies the fixed status weight table (present 1.0, late 0.75, excused
//! 0.5, absent 0.0) to attendance records, both per assignment and as an
//! hour-weighted summary across employees for attendance reports.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, AttendanceStatus, Employee, PayPeriod};

use super::rounding::{percentage, round_factor};

/// Mean status weight of the records, rounded to four places.
///
/// Returns zero when there are no records.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::weighted_attendance_factor;
/// use rust_decimal::Decimal;
///
/// assert_eq!(weighted_attendance_factor(&[]), Decimal::ZERO);
/// ```
pub fn weighted_attendance_factor(records: &[AttendanceRecord]) -> Decimal {
    round_factor(mean_attendance_weight(records))
}

/// Mean status weight of the records at full precision.
///
/// Amounts are scaled by this value; only stored factors are rounded.
/// Returns zero when there are no records.
pub fn mean_attendance_weight(records: &[AttendanceRecord]) -> Decimal {
    if records.is_empty() {
        return Decimal::ZERO;
    }
    let weights: Decimal = records.iter().map(AttendanceRecord::attendance_factor).sum();
    weights / Decimal::from(records.len())
}

/// Weighted attendance rate as a percentage: the factor × 100.
pub fn weighted_attendance_rate(records: &[AttendanceRecord]) -> Decimal {
    weighted_attendance_factor(records) * Decimal::ONE_HUNDRED
}

/// One attendance record with the employee it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// The employee who owns the record's assignment.
    pub employee: Employee,
    /// The attendance record.
    pub record: AttendanceRecord,
}

/// Hours by status with the hour-weighted rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursBreakdown {
    /// Hours across all statuses.
    pub total_hours: Decimal,
    /// Hours marked present.
    pub present_hours: Decimal,
    /// Hours marked late.
    pub late_hours: Decimal,
    /// Hours marked excused.
    pub excused_hours: Decimal,
    /// Hours marked absent.
    pub absent_hours: Decimal,
    /// Hours weighted by status.
    pub weighted_hours: Decimal,
    /// `weighted_hours / total_hours × 100`, or zero without hours.
    pub rate: Decimal,
}

impl HoursBreakdown {
    fn add(&mut self, record: &AttendanceRecord) {
        self.total_hours += record.hours;
        self.weighted_hours += record.weighted_hours();
        match record.status {
            AttendanceStatus::Present => self.present_hours += record.hours,
            AttendanceStatus::Late => self.late_hours += record.hours,
            AttendanceStatus::Excused => self.excused_hours += record.hours,
            AttendanceStatus::Absent => self.absent_hours += record.hours,
        }
    }

    fn finish(&mut self) {
        self.rate = percentage(self.weighted_hours, self.total_hours);
    }
}

/// Hours for one employee in an attendance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeHours {
    /// Name shown in the report.
    pub name: String,
    /// The employee's hours.
    pub hours: HoursBreakdown,
}

/// Hour-weighted attendance summary for a report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceHoursSummary {
    /// The report window.
    pub period: PayPeriod,
    /// Number of records in the window.
    pub total_records: usize,
    /// Hours across every employee.
    pub hours: HoursBreakdown,
    /// Hours per employee id.
    pub per_employee: BTreeMap<i64, EmployeeHours>,
}

/// Summarizes report rows into hour-weighted attendance.
///
/// Rows dated outside `period` are ignored.
pub fn summarize_attendance_hours(period: &PayPeriod, rows: &[ReportRow]) -> AttendanceHoursSummary {
    let mut hours = HoursBreakdown::default();
    let mut per_employee: BTreeMap<i64, EmployeeHours> = BTreeMap::new();
    let mut total_records = 0;

    for row in rows.iter().filter(|row| period.contains_date(row.record.date)) {
        total_records += 1;
        hours.add(&row.record);
        per_employee
            .entry(row.employee.id)
            .or_insert_with(|| EmployeeHours {
                name: row.employee.display_name.clone(),
                hours: HoursBreakdown::default(),
            })
            .hours
            .add(&row.record);
    }

    hours.finish();
    for employee in per_employee.values_mut() {
        employee.hours.finish();
    }

    AttendanceHoursSummary {
        period: *period,
        total_records,
        hours,
        per_employee,
    }
}
