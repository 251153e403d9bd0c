//! Salary records and base-pay suggestions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{NewSalaryRecord, PayPeriod, SalaryRecord};
use crate::store::{employees, salary};

use super::PayrollService;

impl PayrollService {
    /// Records a new salary for an employee.
    ///
    /// An open salary that started earlier is closed the day before the new
    /// one takes effect. A new salary may not start on or before the open
    /// one's start.
    pub async fn record_salary(&self, new: NewSalaryRecord) -> EngineResult<SalaryRecord> {
        let operation_id = Uuid::new_v4();
        new.validate()?;

        let mut tx = self.db.pool().begin().await?;
        employees::require(&mut tx, new.employee_id).await?;

        if let Some(current) = salary::find_open(&mut tx, new.employee_id).await? {
            if current.effective_date >= new.effective_date {
                return Err(EngineError::validation(
                    "effective_date",
                    format!(
                        "must be after the current salary's start {}",
                        current.effective_date
                    ),
                ));
            }
            let end_date = new.effective_date.pred_opt().unwrap_or(new.effective_date);
            salary::close(&mut tx, current.id, end_date).await?;
            debug!(
                operation_id = %operation_id,
                salary_id = current.id,
                end_date = %end_date,
                "Previous salary closed"
            );
        }

        let record = salary::insert(&mut tx, &new).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            salary_id = record.id,
            employee_id = record.employee_id,
            salary_type = %record.salary_type,
            effective_date = %record.effective_date,
            "Salary recorded"
        );
        Ok(record)
    }

    /// Every salary of an employee, latest start first.
    pub async fn salary_history(&self, employee_id: i64) -> EngineResult<Vec<SalaryRecord>> {
        let mut conn = self.db.pool().acquire().await?;
        employees::require(&mut conn, employee_id).await?;
        salary::history(&mut conn, employee_id).await
    }

    /// Base pay suggested for a payroll over the given period.
    ///
    /// Uses the salary in force on the period's last day, prorated by the
    /// period's length. Returns `None` when no salary applies, so the caller
    /// can pass the result as `CreatePayrollRequest::base_pay` or fall back
    /// to its own figure.
    pub async fn suggested_base_pay(
        &self,
        employee_id: i64,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> EngineResult<Option<Decimal>> {
        let period = PayPeriod::new(period_start, period_end)?;
        let mut conn = self.db.pool().acquire().await?;
        employees::require(&mut conn, employee_id).await?;

        let active = salary::active_on(&mut conn, employee_id, period.end_date).await?;
        let suggestion = active.as_ref().map(|record| record.base_pay_for(&period));
        debug!(
            employee_id,
            salary_id = active.as_ref().map(|record| record.id),
            suggestion = ?suggestion,
            "Base pay suggested"
        );
        Ok(suggestion)
    }
}
