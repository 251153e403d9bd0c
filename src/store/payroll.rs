//! Payroll record and line item store.
//!
//! Line totals are never summed in SQL: amounts are TEXT, so sums are taken
//! over parsed decimals in Rust.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    NewDeduction, NewUnitLine, PayPeriod, PaymentMethod, PayrollDeductionLine, PayrollDetail,
    PayrollRecord, PayrollStatus, PayrollUnitLine,
};

use super::{decimal_column, enum_column, optional_decimal_column, optional_enum_column};

const COLUMNS: &str = "id, employee_id, period_start, period_end, base_pay, unit_pay, deductions, payment_date, payment_method, reference_number, status, notes, created_by, created_at, updated_at";

/// A payroll record about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayroll {
    /// The employee being paid.
    pub employee_id: i64,
    /// The pay period.
    pub period: PayPeriod,
    /// Fixed pay component.
    pub base_pay: Decimal,
    /// Teaching earnings component.
    pub unit_pay: Decimal,
    /// Total of all deductions.
    pub deductions: Decimal,
    /// Payment date.
    pub payment_date: Option<NaiveDate>,
    /// Payment method.
    pub payment_method: Option<PaymentMethod>,
    /// External payment reference.
    pub reference_number: Option<String>,
    /// Initial status.
    pub status: PayrollStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// The user creating the record.
    pub created_by: i64,
}

/// Filters for listing payroll records. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollFilter {
    /// Only this employee's records.
    #[serde(default)]
    pub employee_id: Option<i64>,
    /// Only records in this status.
    #[serde(default)]
    pub status: Option<PayrollStatus>,
    /// Only records whose period overlaps this one.
    #[serde(default)]
    pub period: Option<PayPeriod>,
}

fn record_from_row(row: &SqliteRow) -> EngineResult<PayrollRecord> {
    Ok(PayrollRecord {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        period_start: row.try_get("period_start")?,
        period_end: row.try_get("period_end")?,
        base_pay: decimal_column(row, "base_pay")?,
        unit_pay: decimal_column(row, "unit_pay")?,
        deductions: decimal_column(row, "deductions")?,
        payment_date: row.try_get("payment_date")?,
        payment_method: optional_enum_column(row, "payment_method")?,
        reference_number: row.try_get("reference_number")?,
        status: enum_column(row, "status")?,
        notes: row.try_get("notes")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn deduction_line_from_row(row: &SqliteRow) -> EngineResult<PayrollDeductionLine> {
    Ok(PayrollDeductionLine {
        id: row.try_get("id")?,
        payroll_id: row.try_get("payroll_id")?,
        deduction_type: enum_column(row, "deduction_type")?,
        description: row.try_get("description")?,
        amount: decimal_column(row, "amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn unit_line_from_row(row: &SqliteRow) -> EngineResult<PayrollUnitLine> {
    Ok(PayrollUnitLine {
        id: row.try_get("id")?,
        payroll_id: row.try_get("payroll_id")?,
        assignment_id: row.try_get("assignment_id")?,
        unit_value: decimal_column(row, "unit_value")?,
        rate_per_unit: decimal_column(row, "rate_per_unit")?,
        attendance_factor: decimal_column(row, "attendance_factor")?,
        hours_taught: optional_decimal_column(row, "hours_taught")?,
        earnings_basis: enum_column(row, "earnings_basis")?,
        total_amount: decimal_column(row, "total_amount")?,
    })
}

/// Inserts a payroll record and returns its id.
pub async fn insert(conn: &mut SqliteConnection, new: &NewPayroll) -> EngineResult<i64> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO payroll (employee_id, period_start, period_end, base_pay, unit_pay, deductions, payment_date, payment_method, reference_number, status, notes, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13) RETURNING id",
    )
    .bind(new.employee_id)
    .bind(new.period.start_date)
    .bind(new.period.end_date)
    .bind(new.base_pay.to_string())
    .bind(new.unit_pay.to_string())
    .bind(new.deductions.to_string())
    .bind(new.payment_date)
    .bind(new.payment_method.map(PaymentMethod::as_str))
    .bind(&new.reference_number)
    .bind(new.status.as_str())
    .bind(&new.notes)
    .bind(new.created_by)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Appends a deduction line to a payroll record.
pub async fn insert_deduction_line(
    conn: &mut SqliteConnection,
    payroll_id: i64,
    line: &NewDeduction,
) -> EngineResult<PayrollDeductionLine> {
    let created_at = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO payroll_deduction (payroll_id, deduction_type, description, amount, created_at) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(payroll_id)
    .bind(line.deduction_type.as_str())
    .bind(&line.description)
    .bind(line.amount.to_string())
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(PayrollDeductionLine {
        id,
        payroll_id,
        deduction_type: line.deduction_type,
        description: line.description.clone(),
        amount: line.amount,
        created_at,
    })
}

/// Appends a unit line to a payroll record.
pub async fn insert_unit_line(
    conn: &mut SqliteConnection,
    payroll_id: i64,
    line: &NewUnitLine,
) -> EngineResult<PayrollUnitLine> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO payroll_unit (payroll_id, assignment_id, unit_value, rate_per_unit, attendance_factor, hours_taught, earnings_basis, total_amount) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
    )
    .bind(payroll_id)
    .bind(line.assignment_id)
    .bind(line.unit_value.to_string())
    .bind(line.rate_per_unit.to_string())
    .bind(line.attendance_factor.to_string())
    .bind(line.hours_taught.map(|hours| hours.to_string()))
    .bind(line.earnings_basis.as_str())
    .bind(line.total_amount.to_string())
    .fetch_one(&mut *conn)
    .await?;

    Ok(PayrollUnitLine {
        id,
        payroll_id,
        assignment_id: line.assignment_id,
        unit_value: line.unit_value,
        rate_per_unit: line.rate_per_unit,
        attendance_factor: line.attendance_factor,
        hours_taught: line.hours_taught,
        earnings_basis: line.earnings_basis,
        total_amount: line.total_amount,
    })
}

/// Loads a payroll record without its lines.
pub async fn find(conn: &mut SqliteConnection, id: i64) -> EngineResult<Option<PayrollRecord>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM payroll WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Fails with `NotFound` unless the payroll record exists.
pub async fn require(conn: &mut SqliteConnection, id: i64) -> EngineResult<PayrollRecord> {
    find(conn, id).await?.ok_or(EngineError::NotFound {
        entity: "payroll",
        id,
    })
}

/// A record's deduction lines in insertion order.
pub async fn deduction_lines(
    conn: &mut SqliteConnection,
    payroll_id: i64,
) -> EngineResult<Vec<PayrollDeductionLine>> {
    let rows = sqlx::query(
        "SELECT id, payroll_id, deduction_type, description, amount, created_at FROM payroll_deduction WHERE payroll_id = ? ORDER BY id",
    )
    .bind(payroll_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(deduction_line_from_row).collect()
}

/// A record's unit lines in insertion order.
pub async fn unit_lines(
    conn: &mut SqliteConnection,
    payroll_id: i64,
) -> EngineResult<Vec<PayrollUnitLine>> {
    let rows = sqlx::query(
        "SELECT id, payroll_id, assignment_id, unit_value, rate_per_unit, attendance_factor, hours_taught, earnings_basis, total_amount FROM payroll_unit WHERE payroll_id = ? ORDER BY id",
    )
    .bind(payroll_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(unit_line_from_row).collect()
}

/// Loads a record with all of its lines.
pub async fn detail(conn: &mut SqliteConnection, id: i64) -> EngineResult<PayrollDetail> {
    let record = require(conn, id).await?;
    let deduction_lines = deduction_lines(conn, id).await?;
    let unit_lines = unit_lines(conn, id).await?;
    Ok(PayrollDetail {
        record,
        deduction_lines,
        unit_lines,
    })
}

/// Loads one deduction line by id, whichever payroll owns it.
pub async fn find_deduction_line(
    conn: &mut SqliteConnection,
    line_id: i64,
) -> EngineResult<Option<PayrollDeductionLine>> {
    let row = sqlx::query(
        "SELECT id, payroll_id, deduction_type, description, amount, created_at FROM payroll_deduction WHERE id = ?",
    )
    .bind(line_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(deduction_line_from_row).transpose()
}

/// Deletes a deduction line. Returns false when it does not exist.
pub async fn delete_deduction_line(conn: &mut SqliteConnection, line_id: i64) -> EngineResult<bool> {
    let result = sqlx::query("DELETE FROM payroll_deduction WHERE id = ?")
        .bind(line_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrites the stored unit pay and deductions totals.
pub async fn set_totals(
    conn: &mut SqliteConnection,
    id: i64,
    unit_pay: Decimal,
    deductions: Decimal,
) -> EngineResult<()> {
    sqlx::query("UPDATE payroll SET unit_pay = ?1, deductions = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(unit_pay.to_string())
        .bind(deductions.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Overwrites the stored deductions total.
pub async fn set_deductions(
    conn: &mut SqliteConnection,
    id: i64,
    deductions: Decimal,
) -> EngineResult<()> {
    sqlx::query("UPDATE payroll SET deductions = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(deductions.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Writes every caller-editable field of `record`.
pub async fn save(conn: &mut SqliteConnection, record: &PayrollRecord) -> EngineResult<()> {
    let result = sqlx::query(
        "UPDATE payroll SET period_start = ?1, period_end = ?2, base_pay = ?3, payment_date = ?4, payment_method = ?5, reference_number = ?6, status = ?7, notes = ?8, updated_at = ?9 WHERE id = ?10",
    )
    .bind(record.period_start)
    .bind(record.period_end)
    .bind(record.base_pay.to_string())
    .bind(record.payment_date)
    .bind(record.payment_method.map(PaymentMethod::as_str))
    .bind(&record.reference_number)
    .bind(record.status.as_str())
    .bind(&record.notes)
    .bind(Utc::now())
    .bind(record.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(EngineError::NotFound {
            entity: "payroll",
            id: record.id,
        });
    }
    Ok(())
}

/// Deletes a record and, through the cascade, its lines.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> EngineResult<bool> {
    let result = sqlx::query("DELETE FROM payroll WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Lists records matching the filter, newest first by id.
pub async fn list(
    conn: &mut SqliteConnection,
    filter: &PayrollFilter,
) -> EngineResult<Vec<PayrollRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM payroll WHERE (?1 IS NULL OR employee_id = ?1) AND (?2 IS NULL OR status = ?2) AND (?3 IS NULL OR (period_start <= ?4 AND ?3 <= period_end)) ORDER BY id DESC"
    ))
    .bind(filter.employee_id)
    .bind(filter.status.map(PayrollStatus::as_str))
    .bind(filter.period.map(|period| period.start_date))
    .bind(filter.period.map(|period| period.end_date))
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Non-cancelled records of an employee whose period shares a day with `period`.
///
/// `exclude_id` leaves one record out, typically the one being checked.
pub async fn overlapping(
    conn: &mut SqliteConnection,
    employee_id: i64,
    period: &PayPeriod,
    exclude_id: Option<i64>,
) -> EngineResult<Vec<PayrollRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM payroll WHERE employee_id = ?1 AND period_start <= ?3 AND ?2 <= period_end AND status <> 'cancelled' AND (?4 IS NULL OR id <> ?4) ORDER BY period_start, id"
    ))
    .bind(employee_id)
    .bind(period.start_date)
    .bind(period.end_date)
    .bind(exclude_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(record_from_row).collect()
}
