//! Request and response types for the payroll service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{AssembledPayroll, AssignmentPayroll, AttendanceDeductions, AttendanceStats};
use crate::models::{NewDeduction, PaymentMethod, PayrollDetail, PayrollStatus};

/// Input for creating a payroll from attendance and teaching data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePayrollRequest {
    /// The employee being paid.
    pub employee_id: i64,
    /// First day of the pay period.
    pub period_start: NaiveDate,
    /// Last day of the pay period.
    pub period_end: NaiveDate,
    /// Fixed pay component.
    pub base_pay: Decimal,
    /// Manually entered deductions, persisted one line each.
    #[serde(default)]
    pub manual_deductions: Vec<NewDeduction>,
    /// Payment date, if already known.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Payment method; the configured default when absent.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// External payment reference.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Initial status; the configured initial status when absent.
    #[serde(default)]
    pub status: Option<PayrollStatus>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// The user creating the payroll.
    pub created_by: i64,
}

/// Field changes for an editable payroll. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollUpdate {
    /// New period start.
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    /// New period end.
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    /// New base pay.
    #[serde(default)]
    pub base_pay: Option<Decimal>,
    /// New payment date.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// New payment method.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// New reference number.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Move between `draft` and `pending`.
    #[serde(default)]
    pub status: Option<PayrollStatus>,
    /// New notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A persisted payroll with the computation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollCreated {
    /// The stored record and its lines.
    pub detail: PayrollDetail,
    /// Stats, earnings, deductions and the audit trace.
    pub computation: AssembledPayroll,
}

/// A persisted single-unit payroll generated from an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPayrollCreated {
    /// The stored record and its unit line.
    pub detail: PayrollDetail,
    /// The factor, amount and audit trace.
    pub computation: AssignmentPayroll,
}

/// The attendance side of a payroll, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceOverview {
    /// Aggregated counts and rates.
    pub stats: AttendanceStats,
    /// Policy deductions with the records behind them.
    pub deductions: AttendanceDeductions,
}
