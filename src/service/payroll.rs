//! Payroll lifecycle operations.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{AssemblyInput, assemble_from_assignment, assemble_payroll};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    NewDeduction, PayPeriod, PayrollDetail, PayrollRecord, PayrollStatus, WarningSeverity,
};
use crate::store::payroll::{NewPayroll, PayrollFilter};
use crate::store::{assignments, attendance, employees, payroll};

use super::{
    AssignmentPayrollCreated, CreatePayrollRequest, PayrollCreated, PayrollService, PayrollUpdate,
};

const DUPLICATE_PERIOD: &str = "DUPLICATE_PERIOD";

fn overlap_message(overlaps: &[PayrollRecord]) -> String {
    let ids: Vec<String> = overlaps.iter().map(|record| record.id.to_string()).collect();
    format!(
        "Period overlaps existing payroll(s) {} for the same employee",
        ids.join(", ")
    )
}

impl PayrollService {
    /// Creates a payroll from the employee's attendance and teaching data.
    ///
    /// Reads, totals and line inserts all happen in one transaction. An
    /// overlapping payroll for the same employee does not block creation;
    /// it adds a `DUPLICATE_PERIOD` warning to the audit trace.
    pub async fn create_payroll(&self, request: CreatePayrollRequest) -> EngineResult<PayrollCreated> {
        let operation_id = Uuid::new_v4();
        info!(
            operation_id = %operation_id,
            employee_id = request.employee_id,
            period_start = %request.period_start,
            period_end = %request.period_end,
            "Creating payroll"
        );

        let period = PayPeriod::new(request.period_start, request.period_end)?;
        if request.base_pay < Decimal::ZERO {
            return Err(EngineError::validation("base_pay", "must not be negative"));
        }
        for line in &request.manual_deductions {
            line.validate()?;
        }
        let status = request
            .status
            .unwrap_or(self.config.payroll().initial_status);
        if !status.is_initial() {
            warn!(operation_id = %operation_id, status = %status, "Rejected initial status");
            return Err(EngineError::validation(
                "status",
                format!("a payroll cannot be created as {status}"),
            ));
        }

        let mut tx = self.db.pool().begin().await?;
        employees::require(&mut tx, request.employee_id).await?;
        let employee_assignments =
            assignments::list_for_employee(&mut tx, request.employee_id, None).await?;
        let records = attendance::list_for_employee(&mut tx, request.employee_id, &period).await?;
        let overlaps = payroll::overlapping(&mut tx, request.employee_id, &period, None).await?;

        let mut computation = assemble_payroll(AssemblyInput {
            employee_id: request.employee_id,
            period,
            base_pay: request.base_pay,
            manual_deductions: &request.manual_deductions,
            assignments: &employee_assignments,
            records: &records,
            policy: self.config.deductions(),
        });
        debug!(
            operation_id = %operation_id,
            records = records.len(),
            unit_pay = %computation.unit_pay,
            attendance_deductions = %computation.attendance_deductions.total,
            "Payroll assembled"
        );

        if !overlaps.is_empty() {
            warn!(
                operation_id = %operation_id,
                employee_id = request.employee_id,
                overlapping = overlaps.len(),
                "Payroll period overlaps existing payroll"
            );
            computation
                .audit_trace
                .warn(DUPLICATE_PERIOD, overlap_message(&overlaps), WarningSeverity::Medium);
        }

        let payroll_id = payroll::insert(
            &mut tx,
            &NewPayroll {
                employee_id: request.employee_id,
                period,
                base_pay: request.base_pay,
                unit_pay: computation.unit_pay,
                deductions: computation.deductions_total,
                payment_date: request.payment_date,
                payment_method: request
                    .payment_method
                    .or(Some(self.config.payroll().default_payment_method)),
                reference_number: request.reference_number,
                status,
                notes: request.notes,
                created_by: request.created_by,
            },
        )
        .await?;
        for line in &computation.deduction_lines {
            payroll::insert_deduction_line(&mut tx, payroll_id, line).await?;
        }
        for line in &computation.unit_lines {
            payroll::insert_unit_line(&mut tx, payroll_id, line).await?;
        }
        let detail = payroll::detail(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            payroll_id,
            gross_pay = %computation.gross_pay,
            deductions = %computation.deductions_total,
            net_pay = %computation.net_pay,
            duration_us = computation.audit_trace.duration_us,
            "Payroll created"
        );

        Ok(PayrollCreated {
            detail,
            computation,
        })
    }

    /// Creates a single-unit draft payroll from one assignment.
    ///
    /// The period is the assignment's own dates and the amount is
    /// `unit_value × rate_per_unit × attendance factor` over all of the
    /// assignment's records.
    pub async fn generate_from_assignment(
        &self,
        assignment_id: i64,
        created_by: i64,
    ) -> EngineResult<AssignmentPayrollCreated> {
        let operation_id = Uuid::new_v4();
        info!(operation_id = %operation_id, assignment_id, "Generating payroll from assignment");

        let mut tx = self.db.pool().begin().await?;
        let assignment = assignments::require(&mut tx, assignment_id).await?;
        let records = attendance::list_for_assignment(&mut tx, assignment_id).await?;
        let mut computation = assemble_from_assignment(&assignment, &records);

        let overlaps =
            payroll::overlapping(&mut tx, assignment.employee_id, &computation.period, None).await?;
        if !overlaps.is_empty() {
            warn!(
                operation_id = %operation_id,
                employee_id = assignment.employee_id,
                overlapping = overlaps.len(),
                "Payroll period overlaps existing payroll"
            );
            computation
                .audit_trace
                .warn(DUPLICATE_PERIOD, overlap_message(&overlaps), WarningSeverity::Medium);
        }

        let payroll_id = payroll::insert(
            &mut tx,
            &NewPayroll {
                employee_id: assignment.employee_id,
                period: computation.period,
                base_pay: Decimal::ZERO,
                unit_pay: computation.unit_pay,
                deductions: Decimal::ZERO,
                payment_date: None,
                payment_method: Some(self.config.payroll().default_payment_method),
                reference_number: None,
                status: PayrollStatus::Draft,
                notes: Some(format!(
                    "Generated from assignment {} ({})",
                    assignment.title, assignment.academic_term
                )),
                created_by,
            },
        )
        .await?;
        payroll::insert_unit_line(&mut tx, payroll_id, &computation.unit_line).await?;
        let detail = payroll::detail(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            payroll_id,
            attendance_factor = %computation.attendance_factor,
            unit_pay = %computation.unit_pay,
            "Payroll generated from assignment"
        );

        Ok(AssignmentPayrollCreated {
            detail,
            computation,
        })
    }

    /// Re-sums the persisted lines into `unit_pay` and `deductions`.
    ///
    /// Calling it again without line changes leaves the totals as they are.
    pub async fn recompute_totals(&self, payroll_id: i64) -> EngineResult<PayrollRecord> {
        let operation_id = Uuid::new_v4();
        let mut tx = self.db.pool().begin().await?;
        let record = payroll::require(&mut tx, payroll_id).await?;
        if let Err(err) = record.ensure_editable() {
            warn!(operation_id = %operation_id, payroll_id, status = %record.status, "Rejected recompute");
            return Err(err);
        }

        let unit_pay: Decimal = payroll::unit_lines(&mut tx, payroll_id)
            .await?
            .iter()
            .map(|line| line.total_amount)
            .sum();
        let deductions: Decimal = payroll::deduction_lines(&mut tx, payroll_id)
            .await?
            .iter()
            .map(|line| line.amount)
            .sum();
        payroll::set_totals(&mut tx, payroll_id, unit_pay, deductions).await?;
        let updated = payroll::require(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            payroll_id,
            unit_pay = %unit_pay,
            deductions = %deductions,
            "Payroll totals recomputed"
        );
        Ok(updated)
    }

    /// Appends a deduction line and raises `deductions` by its amount.
    pub async fn add_deduction(
        &self,
        payroll_id: i64,
        deduction: NewDeduction,
    ) -> EngineResult<PayrollDetail> {
        let operation_id = Uuid::new_v4();
        deduction.validate()?;

        let mut tx = self.db.pool().begin().await?;
        let record = payroll::require(&mut tx, payroll_id).await?;
        if let Err(err) = record.ensure_editable() {
            warn!(operation_id = %operation_id, payroll_id, status = %record.status, "Rejected deduction add");
            return Err(err);
        }

        let line = payroll::insert_deduction_line(&mut tx, payroll_id, &deduction).await?;
        payroll::set_deductions(&mut tx, payroll_id, record.deductions + line.amount).await?;
        let detail = payroll::detail(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            payroll_id,
            line_id = line.id,
            amount = %line.amount,
            deductions = %detail.record.deductions,
            "Deduction added"
        );
        Ok(detail)
    }

    /// Deletes a deduction line and lowers `deductions` by its amount.
    ///
    /// A line that belongs to a different payroll is reported as not found.
    pub async fn remove_deduction(&self, payroll_id: i64, line_id: i64) -> EngineResult<PayrollDetail> {
        let operation_id = Uuid::new_v4();
        let mut tx = self.db.pool().begin().await?;
        let record = payroll::require(&mut tx, payroll_id).await?;
        if let Err(err) = record.ensure_editable() {
            warn!(operation_id = %operation_id, payroll_id, status = %record.status, "Rejected deduction removal");
            return Err(err);
        }

        let line = payroll::find_deduction_line(&mut tx, line_id)
            .await?
            .filter(|line| line.payroll_id == payroll_id)
            .ok_or(EngineError::NotFound {
                entity: "deduction line",
                id: line_id,
            })?;
        payroll::delete_deduction_line(&mut tx, line_id).await?;
        payroll::set_deductions(&mut tx, payroll_id, record.deductions - line.amount).await?;
        let detail = payroll::detail(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            payroll_id,
            line_id,
            amount = %line.amount,
            deductions = %detail.record.deductions,
            "Deduction removed"
        );
        Ok(detail)
    }

    /// Applies field changes to a draft or pending payroll.
    ///
    /// Lines and stored totals are left untouched; call
    /// [`PayrollService::recompute_totals`] to re-derive them.
    pub async fn update_payroll(
        &self,
        payroll_id: i64,
        update: PayrollUpdate,
    ) -> EngineResult<PayrollRecord> {
        let operation_id = Uuid::new_v4();
        let mut tx = self.db.pool().begin().await?;
        let mut record = payroll::require(&mut tx, payroll_id).await?;
        if let Err(err) = record.ensure_editable() {
            warn!(operation_id = %operation_id, payroll_id, status = %record.status, "Rejected payroll edit");
            return Err(err);
        }

        let period = PayPeriod::new(
            update.period_start.unwrap_or(record.period_start),
            update.period_end.unwrap_or(record.period_end),
        )?;
        record.period_start = period.start_date;
        record.period_end = period.end_date;

        if let Some(base_pay) = update.base_pay {
            if base_pay < Decimal::ZERO {
                return Err(EngineError::validation("base_pay", "must not be negative"));
            }
            record.base_pay = base_pay;
        }
        if let Some(status) = update.status {
            if !status.is_editable() {
                return Err(EngineError::InvalidTransition {
                    payroll_id,
                    from: record.status,
                    to: status,
                });
            }
            record.status = status;
        }
        if update.payment_date.is_some() {
            record.payment_date = update.payment_date;
        }
        if update.payment_method.is_some() {
            record.payment_method = update.payment_method;
        }
        if update.reference_number.is_some() {
            record.reference_number = update.reference_number;
        }
        if update.notes.is_some() {
            record.notes = update.notes;
        }

        payroll::save(&mut tx, &record).await?;
        let updated = payroll::require(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(operation_id = %operation_id, payroll_id, status = %updated.status, "Payroll updated");
        Ok(updated)
    }

    /// Moves a payroll forward: to `paid` when the payment is complete,
    /// otherwise to `approved`.
    ///
    /// A payroll marked paid without a payment date gets today's date.
    pub async fn process_payroll(
        &self,
        payroll_id: i64,
        payment_complete: bool,
    ) -> EngineResult<PayrollRecord> {
        let operation_id = Uuid::new_v4();
        let mut tx = self.db.pool().begin().await?;
        let mut record = payroll::require(&mut tx, payroll_id).await?;

        let target = if payment_complete {
            PayrollStatus::Paid
        } else {
            PayrollStatus::Approved
        };
        let Some(next) = record.status.processed(payment_complete) else {
            warn!(
                operation_id = %operation_id,
                payroll_id,
                from = %record.status,
                to = %target,
                "Rejected payroll processing"
            );
            return Err(EngineError::InvalidTransition {
                payroll_id,
                from: record.status,
                to: target,
            });
        };

        let from = record.status;
        record.status = next;
        if next == PayrollStatus::Paid && record.payment_date.is_none() {
            record.payment_date = Some(Utc::now().date_naive());
        }
        payroll::save(&mut tx, &record).await?;
        let updated = payroll::require(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(operation_id = %operation_id, payroll_id, from = %from, to = %next, "Payroll processed");
        Ok(updated)
    }

    /// Cancels a payroll. Cancelled is terminal.
    pub async fn cancel_payroll(&self, payroll_id: i64) -> EngineResult<PayrollRecord> {
        let operation_id = Uuid::new_v4();
        let mut tx = self.db.pool().begin().await?;
        let mut record = payroll::require(&mut tx, payroll_id).await?;
        if !record.status.can_cancel() {
            warn!(operation_id = %operation_id, payroll_id, "Payroll already cancelled");
            return Err(EngineError::InvalidTransition {
                payroll_id,
                from: record.status,
                to: PayrollStatus::Cancelled,
            });
        }

        let from = record.status;
        record.status = PayrollStatus::Cancelled;
        payroll::save(&mut tx, &record).await?;
        let updated = payroll::require(&mut tx, payroll_id).await?;
        tx.commit().await?;

        info!(operation_id = %operation_id, payroll_id, from = %from, "Payroll cancelled");
        Ok(updated)
    }

    /// Deletes a payroll together with its lines.
    pub async fn delete_payroll(&self, payroll_id: i64) -> EngineResult<()> {
        let operation_id = Uuid::new_v4();
        let mut conn = self.db.pool().acquire().await?;
        if !payroll::delete(&mut conn, payroll_id).await? {
            return Err(EngineError::NotFound {
                entity: "payroll",
                id: payroll_id,
            });
        }
        info!(operation_id = %operation_id, payroll_id, "Payroll deleted");
        Ok(())
    }

    /// Loads a payroll with its deduction and unit lines.
    pub async fn find_payroll(&self, payroll_id: i64) -> EngineResult<PayrollDetail> {
        let mut conn = self.db.pool().acquire().await?;
        payroll::detail(&mut conn, payroll_id).await
    }

    /// Lists payrolls matching the filter, newest first.
    pub async fn list_payrolls(&self, filter: &PayrollFilter) -> EngineResult<Vec<PayrollRecord>> {
        let mut conn = self.db.pool().acquire().await?;
        payroll::list(&mut conn, filter).await
    }

    /// Non-cancelled payrolls of an employee sharing a day with `period`.
    pub async fn find_overlapping_payrolls(
        &self,
        employee_id: i64,
        period: &PayPeriod,
        exclude_id: Option<i64>,
    ) -> EngineResult<Vec<PayrollRecord>> {
        let mut conn = self.db.pool().acquire().await?;
        payroll::overlapping(&mut conn, employee_id, period, exclude_id).await
    }
}
