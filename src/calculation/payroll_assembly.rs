//! Payroll assembly.
//!
//! Runs the pipeline stages in order and combines their output into the
//! totals and line items of a payroll record. Assembly is pure; persisting
//! the result is the service's job.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::DeductionPolicy;
use crate::models::{
    AttendanceRecord, AuditStep, AuditTrace, EarningsBasis, NewDeduction, NewUnitLine, PayPeriod,
    TeachingAssignment,
};

use super::attendance_deductions::{AttendanceDeductions, calculate_attendance_deductions};
use super::attendance_stats::{AttendanceStats, aggregate_attendance};
use super::rounding::{round_factor, round_money};
use super::teaching_earnings::{TeachingEarnings, calculate_teaching_earnings};
use super::weighted_attendance::mean_attendance_weight;

/// Everything the assembler needs for one employee and period.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    /// The employee being paid.
    pub employee_id: i64,
    /// The pay period.
    pub period: PayPeriod,
    /// Fixed pay component.
    pub base_pay: Decimal,
    /// Manually entered deductions.
    pub manual_deductions: &'a [NewDeduction],
    /// All of the employee's assignments.
    pub assignments: &'a [TeachingAssignment],
    /// Attendance records of those assignments.
    pub records: &'a [AttendanceRecord],
    /// Attendance deduction policy.
    pub policy: &'a DeductionPolicy,
}

/// The assembled totals and lines of a payroll, before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledPayroll {
    /// Aggregated attendance for the period.
    pub stats: AttendanceStats,
    /// Teaching earnings for the period.
    pub earnings: TeachingEarnings,
    /// Attendance-derived deduction candidates.
    pub attendance_deductions: AttendanceDeductions,
    /// Fixed pay component.
    pub base_pay: Decimal,
    /// Teaching earnings total.
    pub unit_pay: Decimal,
    /// Sum of manual deductions.
    pub manual_deductions_total: Decimal,
    /// Manual plus attendance deductions.
    pub deductions_total: Decimal,
    /// `base_pay + unit_pay`.
    pub gross_pay: Decimal,
    /// `gross_pay − deductions_total`.
    pub net_pay: Decimal,
    /// Lines to persist: manual deductions first, then policy lines.
    pub deduction_lines: Vec<NewDeduction>,
    /// Lines to persist: one per assignment with positive earnings.
    pub unit_lines: Vec<NewUnitLine>,
    /// How the totals were reached.
    pub audit_trace: AuditTrace,
}

/// Assembles a payroll from attendance, earnings and deductions.
///
/// Steps:
/// 1. aggregate attendance over the period
/// 2. apply the attendance deduction policy
/// 3. compute teaching earnings for active assignments
/// 4. combine base pay, earnings and deductions into the totals
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{AssemblyInput, assemble_payroll};
/// use payroll_engine::config::DeductionPolicy;
/// use payroll_engine::models::{DeductionType, NewDeduction, PayPeriod};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let period = PayPeriod::new(
///     NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
/// )
/// .unwrap();
/// let manual = vec![NewDeduction::new(DeductionType::Tax, "Income tax", Decimal::from(50))];
///
/// let assembled = assemble_payroll(AssemblyInput {
///     employee_id: 7,
///     period,
///     base_pay: Decimal::from(1000),
///     manual_deductions: &manual,
///     assignments: &[],
///     records: &[],
///     policy: &DeductionPolicy::default(),
/// });
///
/// assert_eq!(assembled.gross_pay, Decimal::from(1000));
/// assert_eq!(assembled.net_pay, Decimal::from(950));
/// ```
pub fn assemble_payroll(input: AssemblyInput<'_>) -> AssembledPayroll {
    let started = Instant::now();
    let mut audit_trace = AuditTrace::default();

    let stats_result = aggregate_attendance(
        input.employee_id,
        &input.period,
        input.assignments,
        input.records,
        audit_trace.next_step_number(),
    );
    audit_trace.steps.push(stats_result.audit_step);

    let deductions_result = calculate_attendance_deductions(
        &stats_result.stats,
        input.policy,
        input.records,
        audit_trace.next_step_number(),
    );
    audit_trace.steps.push(deductions_result.audit_step);

    let earnings_result = calculate_teaching_earnings(
        &input.period,
        input.assignments,
        input.records,
        audit_trace.next_step_number(),
    );
    audit_trace.steps.push(earnings_result.audit_step);

    let attendance_deductions = deductions_result.deductions;
    let earnings = earnings_result.earnings;

    let manual_deductions_total: Decimal =
        input.manual_deductions.iter().map(|line| line.amount).sum();
    let deductions_total = manual_deductions_total + attendance_deductions.total;
    let unit_pay = earnings.total_earnings;
    let gross_pay = input.base_pay + unit_pay;
    let net_pay = gross_pay - deductions_total;

    let deduction_lines: Vec<NewDeduction> = input
        .manual_deductions
        .iter()
        .chain(attendance_deductions.lines.iter())
        .cloned()
        .collect();

    let unit_lines: Vec<NewUnitLine> = earnings
        .units
        .iter()
        .filter(|unit| unit.earnings > Decimal::ZERO)
        .map(|unit| NewUnitLine {
            assignment_id: unit.assignment_id,
            unit_value: unit.unit_value,
            rate_per_unit: unit.rate_per_unit,
            attendance_factor: Decimal::ONE,
            hours_taught: Some(unit.hours_taught),
            earnings_basis: EarningsBasis::HoursTaught,
            total_amount: unit.earnings,
        })
        .collect();

    audit_trace.steps.push(AuditStep {
        step_number: audit_trace.next_step_number(),
        rule_id: "payroll_totals".to_string(),
        rule_name: "Payroll Totals".to_string(),
        input: serde_json::json!({
            "base_pay": input.base_pay.to_string(),
            "unit_pay": unit_pay.to_string(),
            "manual_deductions": manual_deductions_total.to_string(),
            "attendance_deductions": attendance_deductions.total.to_string()
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "deductions": deductions_total.to_string(),
            "net_pay": net_pay.to_string(),
            "deduction_lines": deduction_lines.len(),
            "unit_lines": unit_lines.len()
        }),
        reasoning: format!(
            "${} base + ${} teaching = ${} gross; ${} manual + ${} attendance = ${} deductions; net ${}",
            input.base_pay,
            unit_pay,
            gross_pay,
            manual_deductions_total,
            attendance_deductions.total,
            deductions_total,
            net_pay
        ),
    });

    audit_trace.duration_us = started.elapsed().as_micros() as u64;

    AssembledPayroll {
        stats: stats_result.stats,
        earnings,
        attendance_deductions,
        base_pay: input.base_pay,
        unit_pay,
        manual_deductions_total,
        deductions_total,
        gross_pay,
        net_pay,
        deduction_lines,
        unit_lines,
        audit_trace,
    }
}

/// A single-unit payroll built from one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPayroll {
    /// The assignment's own dates.
    pub period: PayPeriod,
    /// Mean status weight of the assignment's records, rounded to four places.
    pub attendance_factor: Decimal,
    /// The factor as a percentage.
    pub attendance_rate: Decimal,
    /// `unit_value × rate_per_unit × mean weight`, rounded to cents.
    pub unit_pay: Decimal,
    /// The single unit line to persist.
    pub unit_line: NewUnitLine,
    /// How the amount was reached.
    pub audit_trace: AuditTrace,
}

/// Builds a single-unit payroll from an assignment and all of its records.
///
/// The amount is `unit_value × rate_per_unit × factor`, where the factor is
/// the mean status weight over every record of the assignment. The stored
/// factor and rate are rounded; the amount uses the exact mean.
pub fn assemble_from_assignment(
    assignment: &TeachingAssignment,
    records: &[AttendanceRecord],
) -> AssignmentPayroll {
    let started = Instant::now();
    let own_records: Vec<AttendanceRecord> = records
        .iter()
        .filter(|record| record.assignment_id == assignment.id)
        .cloned()
        .collect();

    let mean_weight = mean_attendance_weight(&own_records);
    let attendance_factor = round_factor(mean_weight);
    let attendance_rate = attendance_factor * Decimal::ONE_HUNDRED;
    let unit_pay = round_money(assignment.unit_value * assignment.rate_per_unit * mean_weight);

    let audit_trace = AuditTrace {
        steps: vec![AuditStep {
            step_number: 1,
            rule_id: "assignment_unit_pay".to_string(),
            rule_name: "Assignment Unit Pay".to_string(),
            input: serde_json::json!({
                "assignment_id": assignment.id,
                "unit_value": assignment.unit_value.normalize().to_string(),
                "rate_per_unit": assignment.rate_per_unit.normalize().to_string(),
                "records": own_records.len()
            }),
            output: serde_json::json!({
                "attendance_factor": attendance_factor.normalize().to_string(),
                "mean_weight": mean_weight.to_string(),
                "unit_pay": unit_pay.to_string()
            }),
            reasoning: format!(
                "{} units × ${} × {} weighted attendance = ${}",
                assignment.unit_value.normalize(),
                assignment.rate_per_unit.normalize(),
                attendance_factor.normalize(),
                unit_pay
            ),
        }],
        warnings: vec![],
        duration_us: started.elapsed().as_micros() as u64,
    };

    AssignmentPayroll {
        period: assignment.period(),
        attendance_factor,
        attendance_rate,
        unit_pay,
        unit_line: NewUnitLine {
            assignment_id: assignment.id,
            unit_value: assignment.unit_value,
            rate_per_unit: assignment.rate_per_unit,
            attendance_factor,
            hours_taught: None,
            earnings_basis: EarningsBasis::UnitValue,
            total_amount: unit_pay,
        },
        audit_trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, AttendanceStatus, DeductionType};
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

    fn assignment(id: i64, status: AssignmentStatus) -> TeachingAssignment {
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
            status,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(assignment_id: i64, d: u32, status: AttendanceStatus, hours: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: d as i64,
            assignment_id,
            date: date(d),
            status,
            hours: dec(hours),
            notes: None,
            recorded_by: 1,
            created_at: Utc::now(),
        }
    }

    /// PA-001: 1000 base + 500 teaching - (50 manual + 75 late) = 1375 net
    #[test]
    fn test_totals_combine_every_stage() {
        let assignments = vec![assignment(1, AssignmentStatus::Active)];
        let records = vec![
            record(1, 3, AttendanceStatus::Present, "4"),
            record(1, 4, AttendanceStatus::Late, "2"),
            record(1, 5, AttendanceStatus::Late, "2"),
            record(1, 6, AttendanceStatus::Late, "1"),
            record(1, 7, AttendanceStatus::Late, "1"),
            record(1, 10, AttendanceStatus::Late, "0"),
        ];
        let manual = vec![NewDeduction::new(DeductionType::Tax, "Income tax", dec("50"))];

        let assembled = assemble_payroll(AssemblyInput {
            employee_id: 7,
            period: march(),
            base_pay: dec("1000"),
            manual_deductions: &manual,
            assignments: &assignments,
            records: &records,
            policy: &DeductionPolicy::default(),
        });

        assert_eq!(assembled.unit_pay, dec("500"));
        assert_eq!(assembled.attendance_deductions.total, dec("75"));
        assert_eq!(assembled.gross_pay, dec("1500"));
        assert_eq!(assembled.deductions_total, dec("125"));
        assert_eq!(assembled.net_pay, dec("1375"));
    }

    /// PA-002: deduction lines sum to the deductions total
    #[test]
    fn test_deduction_lines_match_total() {
        let assignments = vec![assignment(1, AssignmentStatus::Active)];
        let records = vec![
            record(1, 3, AttendanceStatus::Absent, "2"),
            record(1, 4, AttendanceStatus::Absent, "2"),
        ];
        let manual = vec![
            NewDeduction::new(DeductionType::Tax, "Income tax", dec("50")),
            NewDeduction::new(DeductionType::Insurance, "Health plan", dec("20.25")),
        ];

        let assembled = assemble_payroll(AssemblyInput {
            employee_id: 7,
            period: march(),
            base_pay: dec("1000"),
            manual_deductions: &manual,
            assignments: &assignments,
            records: &records,
            policy: &DeductionPolicy::default(),
        });

        let line_sum: Decimal = assembled.deduction_lines.iter().map(|l| l.amount).sum();
        assert_eq!(assembled.deduction_lines.len(), 3);
        assert_eq!(line_sum, assembled.deductions_total);
        assert_eq!(assembled.deductions_total, dec("270.25"));
        assert_eq!(assembled.deduction_lines[2].deduction_type, DeductionType::Absence);
    }

    /// PA-003: unit lines only for positive earnings
    #[test]
    fn test_unit_lines_skip_zero_earnings() {
        let assignments = vec![
            assignment(1, AssignmentStatus::Active),
            assignment(2, AssignmentStatus::Active),
        ];
        let records = vec![
            record(1, 3, AttendanceStatus::Present, "2"),
            record(2, 3, AttendanceStatus::Absent, "2"),
        ];

        let assembled = assemble_payroll(AssemblyInput {
            employee_id: 7,
            period: march(),
            base_pay: Decimal::ZERO,
            manual_deductions: &[],
            assignments: &assignments,
            records: &records,
            policy: &DeductionPolicy::default(),
        });

        assert_eq!(assembled.unit_lines.len(), 1);
        let line = &assembled.unit_lines[0];
        assert_eq!(line.assignment_id, 1);
        assert_eq!(line.earnings_basis, EarningsBasis::HoursTaught);
        assert_eq!(line.hours_taught, Some(dec("2")));
        assert_eq!(line.attendance_factor, Decimal::ONE);
        assert_eq!(line.total_amount, dec("100"));
    }

    #[test]
    fn test_stats_include_inactive_assignments() {
        let assignments = vec![
            assignment(1, AssignmentStatus::Active),
            assignment(2, AssignmentStatus::Completed),
        ];
        let records = vec![record(2, 3, AttendanceStatus::Absent, "2")];

        let assembled = assemble_payroll(AssemblyInput {
            employee_id: 7,
            period: march(),
            base_pay: dec("1000"),
            manual_deductions: &[],
            assignments: &assignments,
            records: &records,
            policy: &DeductionPolicy::default(),
        });

        assert_eq!(assembled.stats.overall.absent, 1);
        assert_eq!(assembled.attendance_deductions.total, dec("100"));
        assert!(assembled.unit_lines.is_empty());
    }

    #[test]
    fn test_audit_trace_has_four_sequenced_steps() {
        let assembled = assemble_payroll(AssemblyInput {
            employee_id: 7,
            period: march(),
            base_pay: dec("1000"),
            manual_deductions: &[],
            assignments: &[],
            records: &[],
            policy: &DeductionPolicy::default(),
        });

        let ids: Vec<&str> = assembled.audit_trace.steps.iter().map(|s| s.rule_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["attendance_aggregation", "attendance_deductions", "teaching_earnings", "payroll_totals"]
        );
        let numbers: Vec<u32> = assembled.audit_trace.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    /// PA-004: assignment payroll scales unit value by weighted attendance
    #[test]
    fn test_assemble_from_assignment() {
        let unit = assignment(1, AssignmentStatus::Active);
        let records = vec![
            record(1, 3, AttendanceStatus::Present, "2"),
            record(1, 4, AttendanceStatus::Late, "2"),
            record(1, 5, AttendanceStatus::Excused, "2"),
            record(1, 6, AttendanceStatus::Absent, "2"),
            record(9, 7, AttendanceStatus::Absent, "2"),
        ];

        let payroll = assemble_from_assignment(&unit, &records);

        assert_eq!(payroll.period, march());
        assert_eq!(payroll.attendance_factor, dec("0.5625"));
        assert_eq!(payroll.attendance_rate, dec("56.25"));
        assert_eq!(payroll.unit_pay, dec("84.38"));
        assert_eq!(payroll.unit_line.earnings_basis, EarningsBasis::UnitValue);
        assert_eq!(payroll.unit_line.hours_taught, None);
        assert_eq!(payroll.unit_line.total_amount, payroll.unit_pay);
    }

    /// PA-005: pay uses the exact factor, not the stored four-place one
    #[test]
    fn test_assignment_pay_uses_unrounded_factor() {
        let mut unit = assignment(1, AssignmentStatus::Active);
        unit.rate_per_unit = dec("1000");
        let records = vec![
            record(1, 3, AttendanceStatus::Present, "2"),
            record(1, 4, AttendanceStatus::Present, "2"),
            record(1, 5, AttendanceStatus::Absent, "2"),
        ];

        let payroll = assemble_from_assignment(&unit, &records);

        assert_eq!(payroll.attendance_factor, dec("0.6667"));
        assert_eq!(payroll.attendance_rate, dec("66.67"));
        assert_eq!(payroll.unit_pay, dec("2000"));
        assert_eq!(payroll.unit_line.attendance_factor, dec("0.6667"));
        assert_eq!(payroll.unit_line.total_amount, dec("2000"));
    }

    #[test]
    fn test_assignment_without_records_pays_nothing() {
        let payroll = assemble_from_assignment(&assignment(1, AssignmentStatus::Active), &[]);
        assert_eq!(payroll.unit_pay, Decimal::ZERO);
        assert_eq!(payroll.attendance_factor, Decimal::ZERO);
    }
}
