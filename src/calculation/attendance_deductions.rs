//! Attendance-based deduction policy.
//!
//! Turns aggregated attendance into deduction line candidates: one line for
//! absences, one for late arrivals beyond the per-period allowance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::DeductionPolicy;
use crate::models::{AttendanceRecord, AuditStep, DeductionType, NewDeduction};

use super::attendance_stats::AttendanceStats;
use super::rounding::round_money;

/// Deduction candidates derived from attendance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDeductions {
    /// Candidate lines; empty when nothing applies.
    pub lines: Vec<NewDeduction>,
    /// Sum of the candidate amounts.
    pub total: Decimal,
    /// In-range records of the aggregated assignments, newest first.
    pub records: Vec<AttendanceRecord>,
}

/// The result of applying the deduction policy, including the audit step.
#[derive(Debug, Clone)]
pub struct AttendanceDeductionsResult {
    /// The deduction candidates.
    pub deductions: AttendanceDeductions,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Applies the attendance deduction policy to aggregated stats.
///
/// - absences: `absent × absence_rate`, when at least one day was missed
/// - late arrivals: `(late − allowed) × late_rate`, only for the excess
///
/// `records` is filtered to the stats window and assignments and returned
/// sorted newest first for audit display. Inputs are never mutated.
///
/// # Arguments
///
/// * `stats` - Aggregated attendance for the period
/// * `policy` - Rates and the late allowance
/// * `records` - Attendance records the stats were built from
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{aggregate_attendance, calculate_attendance_deductions};
/// use payroll_engine::config::DeductionPolicy;
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod::new(
///     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
/// )
/// .unwrap();
/// let stats = aggregate_attendance(7, &period, &[], &[], 1).stats;
///
/// let result = calculate_attendance_deductions(&stats, &DeductionPolicy::default(), &[], 2);
/// assert!(result.deductions.lines.is_empty());
/// ```
pub fn calculate_attendance_deductions(
    stats: &AttendanceStats,
    policy: &DeductionPolicy,
    records: &[AttendanceRecord],
    step_number: u32,
) -> AttendanceDeductionsResult {
    let absent_days = stats.overall.absent;
    let late_days = stats.overall.late;
    let excess_late = late_days.saturating_sub(policy.allowed_late_per_period);

    let mut lines = Vec::new();
    let mut applied = Vec::new();

    if absent_days > 0 {
        let amount = round_money(Decimal::from(absent_days) * policy.absence_rate);
        applied.push(format!(
            "{} absent × ${} = ${}",
            absent_days,
            policy.absence_rate.normalize(),
            amount
        ));
        lines.push(NewDeduction::new(
            DeductionType::Absence,
            format!("Absence deduction ({absent_days} days)"),
            amount,
        ));
    }

    if excess_late > 0 {
        let amount = round_money(Decimal::from(excess_late) * policy.late_rate);
        applied.push(format!(
            "{} late - {} allowed = {} excess × ${} = ${}",
            late_days,
            policy.allowed_late_per_period,
            excess_late,
            policy.late_rate.normalize(),
            amount
        ));
        lines.push(NewDeduction::new(
            DeductionType::Late,
            format!("Late arrival deduction ({excess_late} excess days)"),
            amount,
        ));
    }

    let total: Decimal = lines.iter().map(|line| line.amount).sum();

    let mut audit_records: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| {
            stats.period.contains_date(record.date)
                && stats.per_assignment.contains_key(&record.assignment_id)
        })
        .cloned()
        .collect();
    audit_records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let reasoning = if applied.is_empty() {
        format!(
            "{} absent, {} late (allowance {}) - no attendance deductions",
            absent_days, late_days, policy.allowed_late_per_period
        )
    } else {
        format!("{}; total ${}", applied.join("; "), total)
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "attendance_deductions".to_string(),
        rule_name: "Attendance Deductions".to_string(),
        input: serde_json::json!({
            "absent_days": absent_days,
            "late_days": late_days,
            "absence_rate": policy.absence_rate.normalize().to_string(),
            "late_rate": policy.late_rate.normalize().to_string(),
            "allowed_late_per_period": policy.allowed_late_per_period
        }),
        output: serde_json::json!({
            "lines": lines.len(),
            "total": total.to_string()
        }),
        reasoning,
    };

    AttendanceDeductionsResult {
        deductions: AttendanceDeductions {
            lines,
            total,
            records: audit_records,
        },
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::attendance_stats::StatusCounts;
    use crate::models::{AttendanceStatus, PayPeriod};
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn stats_with(absent: u32, late: u32) -> AttendanceStats {
        let counts = StatusCounts {
            total: absent + late,
            present: 0,
            absent,
            late,
            excused: 0,
            rate: Decimal::ZERO,
        };
        let mut per_assignment = BTreeMap::new();
        per_assignment.insert(1, counts.clone());
        AttendanceStats {
            employee_id: 7,
            period: PayPeriod::new(date(1), date(31)).unwrap(),
            per_assignment,
            overall: counts,
        }
    }

    fn record(id: i64, assignment_id: i64, on: NaiveDate) -> AttendanceRecord {
        AttendanceRecord {
            id,
            assignment_id,
            date: on,
            status: AttendanceStatus::Absent,
            hours: dec("2"),
            notes: None,
            recorded_by: 1,
            created_at: Utc::now(),
        }
    }

    /// DP-001: nothing applies within the allowance
    #[test]
    fn test_no_deductions_within_allowance() {
        let result = calculate_attendance_deductions(&stats_with(0, 2), &DeductionPolicy::default(), &[], 1);
        assert!(result.deductions.lines.is_empty());
        assert_eq!(result.deductions.total, Decimal::ZERO);
    }

    /// DP-002: three absences at 100 deduct 300
    #[test]
    fn test_absences_deduct_per_day() {
        let result = calculate_attendance_deductions(&stats_with(3, 0), &DeductionPolicy::default(), &[], 1);

        assert_eq!(result.deductions.lines.len(), 1);
        let line = &result.deductions.lines[0];
        assert_eq!(line.deduction_type, DeductionType::Absence);
        assert_eq!(line.amount, dec("300"));
        assert_eq!(line.description, "Absence deduction (3 days)");
        assert_eq!(result.deductions.total, dec("300"));
    }

    /// DP-003: five late days with allowance 2 deduct only the excess
    #[test]
    fn test_late_days_deduct_excess_only() {
        let result = calculate_attendance_deductions(&stats_with(0, 5), &DeductionPolicy::default(), &[], 1);

        assert_eq!(result.deductions.lines.len(), 1);
        let line = &result.deductions.lines[0];
        assert_eq!(line.deduction_type, DeductionType::Late);
        assert_eq!(line.amount, dec("75"));
        assert_eq!(line.description, "Late arrival deduction (3 excess days)");
    }

    #[test]
    fn test_both_lines_sum_into_total() {
        let result = calculate_attendance_deductions(&stats_with(1, 3), &DeductionPolicy::default(), &[], 1);
        assert_eq!(result.deductions.lines.len(), 2);
        assert_eq!(result.deductions.total, dec("125"));
    }

    #[test]
    fn test_custom_policy_rates() {
        let policy = DeductionPolicy {
            absence_rate: dec("80.50"),
            late_rate: dec("10"),
            allowed_late_per_period: 0,
        };
        let result = calculate_attendance_deductions(&stats_with(2, 1), &policy, &[], 1);
        assert_eq!(result.deductions.lines[0].amount, dec("161.00"));
        assert_eq!(result.deductions.lines[1].amount, dec("10"));
        assert_eq!(result.deductions.total, dec("171.00"));
    }

    #[test]
    fn test_records_filtered_and_sorted_newest_first() {
        let records = vec![
            record(1, 1, date(3)),
            record(2, 1, date(20)),
            record(3, 2, date(10)),
            record(4, 1, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()),
            record(5, 1, date(20)),
        ];

        let result = calculate_attendance_deductions(&stats_with(1, 0), &DeductionPolicy::default(), &records, 1);
        let ids: Vec<i64> = result.deductions.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 2, 1]);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let stats = stats_with(3, 5);
        let records = vec![record(1, 1, date(3)), record(2, 1, date(20))];
        let stats_before = stats.clone();
        let records_before = records.clone();

        let _ = calculate_attendance_deductions(&stats, &DeductionPolicy::default(), &records, 1);

        assert_eq!(stats, stats_before);
        assert_eq!(records, records_before);
    }
}
