//! Read-side pipeline stages for reporting consumers.

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculation::{
    AttendanceHoursSummary, ReportRow, TeachingEarnings, aggregate_attendance,
    calculate_attendance_deductions, calculate_teaching_earnings, summarize_attendance_hours,
    weighted_attendance_rate,
};
use crate::error::EngineResult;
use crate::models::PayPeriod;
use crate::store::{assignments, attendance, employees};

use super::{AttendanceOverview, PayrollService};

impl PayrollService {
    /// Attendance stats and policy deductions for an employee and period.
    pub async fn attendance_for_payroll(
        &self,
        employee_id: i64,
        period: &PayPeriod,
    ) -> EngineResult<AttendanceOverview> {
        let mut conn = self.db.pool().acquire().await?;
        employees::require(&mut conn, employee_id).await?;
        let employee_assignments = assignments::list_for_employee(&mut conn, employee_id, None).await?;
        let records = attendance::list_for_employee(&mut conn, employee_id, period).await?;

        let stats = aggregate_attendance(employee_id, period, &employee_assignments, &records, 1).stats;
        let deductions =
            calculate_attendance_deductions(&stats, self.config.deductions(), &records, 2).deductions;

        debug!(
            employee_id,
            total = stats.overall.total,
            deductions = %deductions.total,
            "Attendance overview computed"
        );
        Ok(AttendanceOverview { stats, deductions })
    }

    /// Hours taught and earnings per active assignment for an employee and period.
    pub async fn teaching_data_for_payroll(
        &self,
        employee_id: i64,
        period: &PayPeriod,
    ) -> EngineResult<TeachingEarnings> {
        let mut conn = self.db.pool().acquire().await?;
        employees::require(&mut conn, employee_id).await?;
        let employee_assignments = assignments::list_for_employee(&mut conn, employee_id, None).await?;
        let records = attendance::list_for_employee(&mut conn, employee_id, period).await?;

        let earnings = calculate_teaching_earnings(period, &employee_assignments, &records, 1).earnings;
        debug!(
            employee_id,
            total_hours = %earnings.total_hours,
            total_earnings = %earnings.total_earnings,
            "Teaching data computed"
        );
        Ok(earnings)
    }

    /// Hour-weighted attendance summary over a period.
    ///
    /// `employee_id` and `assignment_id` narrow the records when given.
    pub async fn attendance_report(
        &self,
        period: &PayPeriod,
        employee_id: Option<i64>,
        assignment_id: Option<i64>,
    ) -> EngineResult<AttendanceHoursSummary> {
        let mut conn = self.db.pool().acquire().await?;
        let rows: Vec<ReportRow> =
            attendance::list_with_employee(&mut conn, period, employee_id, assignment_id)
                .await?
                .into_iter()
                .map(|(employee, record)| ReportRow { employee, record })
                .collect();

        Ok(summarize_attendance_hours(period, &rows))
    }

    /// Weighted attendance rate over all of an assignment's records.
    pub async fn assignment_attendance_rate(&self, assignment_id: i64) -> EngineResult<Decimal> {
        let mut conn = self.db.pool().acquire().await?;
        assignments::require(&mut conn, assignment_id).await?;
        let records = attendance::list_for_assignment(&mut conn, assignment_id).await?;
        Ok(weighted_attendance_rate(&records))
    }
}
