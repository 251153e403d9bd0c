//! Attendance aggregation.
//!
//! Reduces an employee's attendance records over a closed date window into
//! per-status counts, per assignment and overall. The rate reported here is
//! the unweighted share of `present` records; the weighted rate lives in
//! [`super::weighted_attendance`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, AttendanceStatus, AuditStep, PayPeriod, TeachingAssignment};

use super::rounding::percentage;

/// Per-status record counts with the unweighted attendance rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Records in the window.
    pub total: u32,
    /// Records marked present.
    pub present: u32,
    /// Records marked absent.
    pub absent: u32,
    /// Records marked late.
    pub late: u32,
    /// Records marked excused.
    pub excused: u32,
    /// `present / total × 100`, or zero when there are no records.
    pub rate: Decimal,
}

impl StatusCounts {
    fn record(&mut self, status: AttendanceStatus) {
        self.total += 1;
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Excused => self.excused += 1,
        }
    }

    fn absorb(&mut self, other: &StatusCounts) {
        self.total += other.total;
        self.present += other.present;
        self.absent += other.absent;
        self.late += other.late;
        self.excused += other.excused;
    }

    fn finish(&mut self) {
        self.rate = percentage(Decimal::from(self.present), Decimal::from(self.total));
    }

    /// Sum of the four status counters. Always equals `total`.
    pub fn status_sum(&self) -> u32 {
        self.present + self.absent + self.late + self.excused
    }
}

/// Aggregated attendance for one employee over one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// The employee the stats describe.
    pub employee_id: i64,
    /// The window the records were filtered to.
    pub period: PayPeriod,
    /// Counts per assignment id, including assignments without records.
    pub per_assignment: BTreeMap<i64, StatusCounts>,
    /// Counts across every assignment.
    pub overall: StatusCounts,
}

/// The result of aggregating attendance, including the stats and audit step.
#[derive(Debug, Clone)]
pub struct AttendanceStatsResult {
    /// The aggregated stats.
    pub stats: AttendanceStats,
    /// The audit step recording this aggregation.
    pub audit_step: AuditStep,
}

/// Aggregates attendance records for an employee's assignments over a window.
///
/// Records dated outside `period` (inclusive at both ends) or belonging to
/// an assignment not in `assignments` are ignored. Every assignment appears
/// in `per_assignment`, with zero counts when it has no records in range.
/// Duplicate records for the same assignment and date are each counted.
///
/// # Arguments
///
/// * `employee_id` - The employee the assignments belong to
/// * `period` - The closed date window
/// * `assignments` - The employee's assignments
/// * `records` - Attendance records for those assignments
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::aggregate_attendance;
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
/// let result = aggregate_attendance(7, &period, &[], &[], 1);
/// assert_eq!(result.stats.overall.total, 0);
/// assert_eq!(result.stats.overall.rate, Decimal::ZERO);
/// ```
pub fn aggregate_attendance(
    employee_id: i64,
    period: &PayPeriod,
    assignments: &[TeachingAssignment],
    records: &[AttendanceRecord],
    step_number: u32,
) -> AttendanceStatsResult {
    let mut per_assignment: BTreeMap<i64, StatusCounts> = assignments
        .iter()
        .map(|assignment| (assignment.id, StatusCounts::default()))
        .collect();

    let mut ignored = 0u32;
    for record in records {
        match per_assignment.get_mut(&record.assignment_id) {
            Some(counts) if period.contains_date(record.date) => counts.record(record.status),
            _ => ignored += 1,
        }
    }

    let mut overall = StatusCounts::default();
    for counts in per_assignment.values_mut() {
        counts.finish();
        overall.absorb(counts);
    }
    overall.finish();

    let assignment_count = per_assignment.len();

    let audit_step = AuditStep {
        step_number,
        rule_id: "attendance_aggregation".to_string(),
        rule_name: "Attendance Aggregation".to_string(),
        input: serde_json::json!({
            "employee_id": employee_id,
            "period_start": period.start_date.to_string(),
            "period_end": period.end_date.to_string(),
            "assignments": assignment_count,
            "records": records.len()
        }),
        output: serde_json::json!({
            "total": overall.total,
            "present": overall.present,
            "absent": overall.absent,
            "late": overall.late,
            "excused": overall.excused,
            "rate": overall.rate.normalize().to_string()
        }),
        reasoning: format!(
            "{} records in range across {} assignments ({} ignored): {} present of {} = {}%",
            overall.total,
            assignment_count,
            ignored,
            overall.present,
            overall.total,
            overall.rate.normalize()
        ),
    };

    AttendanceStatsResult {
        stats: AttendanceStats {
            employee_id,
            period: *period,
            per_assignment,
            overall,
        },
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssignmentStatus;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn march() -> PayPeriod {
        PayPeriod::new(date(1), date(31)).unwrap()
    }

    fn assignment(id: i64) -> TeachingAssignment {
        TeachingAssignment {
            id,
            employee_id: 7,
            title: format!("Unit {id}"),
            code: None,
            academic_term: "2024-2025 Spring".to_string(),
            start_date: date(1),
            end_date: date(31),
            hours_per_week: dec("3"),
            unit_value: dec("3"),
            rate_per_unit: dec("50"),
            status: AssignmentStatus::Active,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(assignment_id: i64, on: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            assignment_id,
            date: on,
            status,
            hours: dec("2"),
            notes: None,
            recorded_by: 1,
            created_at: Utc::now(),
        }
    }

    /// AG-001: counts tally per status and rate uses present only
    #[test]
    fn test_counts_and_unweighted_rate() {
        let records = vec![
            record(1, date(3), AttendanceStatus::Present),
            record(1, date(4), AttendanceStatus::Late),
            record(1, date(5), AttendanceStatus::Excused),
            record(1, date(6), AttendanceStatus::Absent),
        ];

        let result = aggregate_attendance(7, &march(), &[assignment(1)], &records, 1);
        let counts = &result.stats.per_assignment[&1];

        assert_eq!(counts.total, 4);
        assert_eq!(counts.present, 1);
        assert_eq!(counts.late, 1);
        assert_eq!(counts.excused, 1);
        assert_eq!(counts.absent, 1);
        assert_eq!(counts.rate, dec("25"));
        assert_eq!(result.stats.overall, *counts);
    }

    /// AG-002: window filter is inclusive at both ends
    #[test]
    fn test_window_is_inclusive() {
        let records = vec![
            record(1, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(), AttendanceStatus::Present),
            record(1, date(1), AttendanceStatus::Present),
            record(1, date(31), AttendanceStatus::Absent),
            record(1, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), AttendanceStatus::Present),
        ];

        let result = aggregate_attendance(7, &march(), &[assignment(1)], &records, 1);
        assert_eq!(result.stats.overall.total, 2);
        assert_eq!(result.stats.overall.rate, dec("50"));
    }

    /// AG-003: assignments without records appear with zero counts
    #[test]
    fn test_assignment_without_records_is_included() {
        let records = vec![record(1, date(3), AttendanceStatus::Present)];

        let result =
            aggregate_attendance(7, &march(), &[assignment(1), assignment(2)], &records, 1);
        let empty = &result.stats.per_assignment[&2];

        assert_eq!(empty.total, 0);
        assert_eq!(empty.rate, Decimal::ZERO);
        assert_eq!(result.stats.overall.total, 1);
        assert_eq!(result.stats.overall.rate, dec("100"));
    }

    /// AG-004: no assignments yields all-zero stats
    #[test]
    fn test_no_assignments_yields_zero() {
        let result = aggregate_attendance(7, &march(), &[], &[], 1);
        assert!(result.stats.per_assignment.is_empty());
        assert_eq!(result.stats.overall, StatusCounts::default());
    }

    /// AG-005: records of unknown assignments are ignored
    #[test]
    fn test_foreign_records_are_ignored() {
        let records = vec![
            record(1, date(3), AttendanceStatus::Present),
            record(99, date(3), AttendanceStatus::Absent),
        ];

        let result = aggregate_attendance(7, &march(), &[assignment(1)], &records, 1);
        assert_eq!(result.stats.overall.total, 1);
        assert!(!result.stats.per_assignment.contains_key(&99));
    }

    /// AG-006: duplicate records on the same date are summed
    #[test]
    fn test_duplicates_are_counted() {
        let records = vec![
            record(1, date(3), AttendanceStatus::Present),
            record(1, date(3), AttendanceStatus::Present),
        ];

        let result = aggregate_attendance(7, &march(), &[assignment(1)], &records, 1);
        assert_eq!(result.stats.overall.present, 2);
    }

    #[test]
    fn test_overall_rate_is_pooled_not_averaged() {
        let records = vec![
            record(1, date(3), AttendanceStatus::Present),
            record(2, date(3), AttendanceStatus::Present),
            record(2, date(4), AttendanceStatus::Absent),
            record(2, date(5), AttendanceStatus::Absent),
        ];

        let result =
            aggregate_attendance(7, &march(), &[assignment(1), assignment(2)], &records, 1);
        assert_eq!(result.stats.per_assignment[&1].rate, dec("100"));
        assert_eq!(result.stats.per_assignment[&2].rate, dec("33.33"));
        assert_eq!(result.stats.overall.rate, dec("50"));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let records = vec![
            record(1, date(3), AttendanceStatus::Late),
            record(1, date(4), AttendanceStatus::Present),
        ];
        let first = aggregate_attendance(7, &march(), &[assignment(1)], &records, 1);
        let second = aggregate_attendance(7, &march(), &[assignment(1)], &records, 1);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn test_audit_step_records_counts() {
        let records = vec![record(1, date(3), AttendanceStatus::Present)];
        let result = aggregate_attendance(7, &march(), &[assignment(1)], &records, 4);

        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "attendance_aggregation");
        assert_eq!(result.audit_step.output["total"], 1);
    }
}
