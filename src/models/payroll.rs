//! Payroll record and line item models.
//!
//! A [`PayrollRecord`] exclusively owns its [`PayrollDeductionLine`]s and
//! [`PayrollUnitLine`]s; deleting the record deletes its lines.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::PayPeriod;

/// Lifecycle status of a payroll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Being prepared.
    Draft,
    /// Awaiting approval.
    Pending,
    /// Approved but not yet paid.
    Approved,
    /// Paid out.
    Paid,
    /// Cancelled. Terminal.
    Cancelled,
}

impl_text_enum!(PayrollStatus, "payroll status", {
    Draft => "draft",
    Pending => "pending",
    Approved => "approved",
    Paid => "paid",
    Cancelled => "cancelled",
});

impl PayrollStatus {
    /// Returns true while the record and its lines may still be changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::PayrollStatus;
    ///
    /// assert!(PayrollStatus::Draft.is_editable());
    /// assert!(!PayrollStatus::Approved.is_editable());
    /// ```
    pub fn is_editable(self) -> bool {
        matches!(self, PayrollStatus::Draft | PayrollStatus::Pending)
    }

    /// Returns true for statuses a record may be created in.
    pub fn is_initial(self) -> bool {
        self.is_editable()
    }

    /// The status reached by processing a record in this status.
    ///
    /// Returns `None` when processing is not allowed.
    pub fn processed(self, payment_complete: bool) -> Option<PayrollStatus> {
        match (self, payment_complete) {
            (PayrollStatus::Draft | PayrollStatus::Pending, true) => Some(PayrollStatus::Paid),
            (PayrollStatus::Draft | PayrollStatus::Pending, false) => {
                Some(PayrollStatus::Approved)
            }
            (PayrollStatus::Approved, true) => Some(PayrollStatus::Paid),
            _ => None,
        }
    }

    /// Returns true unless the record is already cancelled.
    pub fn can_cancel(self) -> bool {
        self != PayrollStatus::Cancelled
    }
}

/// How a payroll is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Bank transfer.
    BankTransfer,
    /// Paper check.
    Check,
    /// Cash.
    Cash,
    /// Direct deposit.
    DirectDeposit,
}

impl_text_enum!(PaymentMethod, "payment method", {
    BankTransfer => "bank_transfer",
    Check => "check",
    Cash => "cash",
    DirectDeposit => "direct_deposit",
});

/// The category of a deduction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// Income tax withholding.
    Tax,
    /// Insurance premium.
    Insurance,
    /// Retirement contribution.
    Retirement,
    /// Attendance policy: absences.
    Absence,
    /// Attendance policy: excess late arrivals.
    Late,
    /// Anything else.
    Other,
}

impl_text_enum!(DeductionType, "deduction type", {
    Tax => "tax",
    Insurance => "insurance",
    Retirement => "retirement",
    Absence => "absence",
    Late => "late",
    Other => "other",
});

/// The formula a unit line's total was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsBasis {
    /// `hours_taught × rate_per_unit` (regular payroll creation).
    HoursTaught,
    /// `unit_value × rate_per_unit × attendance_factor` (generated from an assignment).
    UnitValue,
}

impl_text_enum!(EarningsBasis, "earnings basis", {
    HoursTaught => "hours_taught",
    UnitValue => "unit_value",
});

/// One pay computation for one employee over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Unique identifier for the record.
    pub id: i64,
    /// The employee being paid.
    pub employee_id: i64,
    /// First day of the pay period.
    pub period_start: NaiveDate,
    /// Last day of the pay period.
    pub period_end: NaiveDate,
    /// Fixed pay component.
    pub base_pay: Decimal,
    /// Teaching earnings component.
    pub unit_pay: Decimal,
    /// Total of all deductions.
    pub deductions: Decimal,
    /// When the payment was (or will be) made.
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// How the payment is made.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// External payment reference.
    #[serde(default)]
    pub reference_number: Option<String>,
    /// Lifecycle status.
    pub status: PayrollStatus,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// The user who created the record.
    pub created_by: i64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl PayrollRecord {
    /// Returns the pay period.
    pub fn period(&self) -> PayPeriod {
        PayPeriod {
            start_date: self.period_start,
            end_date: self.period_end,
        }
    }

    /// Gross pay: base pay plus unit pay.
    pub fn total_pay(&self) -> Decimal {
        self.base_pay + self.unit_pay
    }

    /// Net pay: gross pay minus deductions.
    pub fn net_pay(&self) -> Decimal {
        self.total_pay() - self.deductions
    }

    /// Fails with `PayrollNotEditable` unless the status allows edits.
    pub fn ensure_editable(&self) -> EngineResult<()> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(EngineError::PayrollNotEditable {
                payroll_id: self.id,
                status: self.status,
            })
        }
    }
}

/// A deduction line owned by a payroll record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollDeductionLine {
    /// Unique identifier for the line.
    pub id: i64,
    /// The owning payroll record.
    pub payroll_id: i64,
    /// Deduction category.
    #[serde(rename = "type")]
    pub deduction_type: DeductionType,
    /// Human-readable description.
    pub description: String,
    /// Deducted amount (non-negative).
    pub amount: Decimal,
    /// When the line was stored.
    pub created_at: DateTime<Utc>,
}

/// A teaching-unit earnings line owned by a payroll record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollUnitLine {
    /// Unique identifier for the line.
    pub id: i64,
    /// The owning payroll record.
    pub payroll_id: i64,
    /// The referenced teaching assignment.
    pub assignment_id: i64,
    /// Units (credits) of the assignment.
    pub unit_value: Decimal,
    /// Rate per unit.
    pub rate_per_unit: Decimal,
    /// Attendance adjustment between 0 and 1.
    pub attendance_factor: Decimal,
    /// Hours taught in the period, for hours-based lines.
    #[serde(default)]
    pub hours_taught: Option<Decimal>,
    /// The formula `total_amount` was computed with.
    pub earnings_basis: EarningsBasis,
    /// Amount paid for this unit.
    pub total_amount: Decimal,
}

/// A deduction to add to a payroll record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeduction {
    /// Deduction category.
    #[serde(rename = "type")]
    pub deduction_type: DeductionType,
    /// Human-readable description (1-100 characters).
    pub description: String,
    /// Deducted amount (non-negative).
    pub amount: Decimal,
}

impl NewDeduction {
    /// Creates a new deduction.
    pub fn new(deduction_type: DeductionType, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            deduction_type,
            description: description.into(),
            amount,
        }
    }

    /// Checks the description length and that the amount is not negative.
    pub fn validate(&self) -> EngineResult<()> {
        let length = self.description.trim().chars().count();
        if length == 0 || self.description.chars().count() > 100 {
            return Err(EngineError::validation(
                "description",
                "must be between 1 and 100 characters",
            ));
        }
        if self.amount < Decimal::ZERO {
            return Err(EngineError::validation(
                "amount",
                format!("{} must not be negative", self.amount),
            ));
        }
        Ok(())
    }
}

/// A unit line about to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUnitLine {
    /// The referenced teaching assignment.
    pub assignment_id: i64,
    /// Units (credits) of the assignment.
    pub unit_value: Decimal,
    /// Rate per unit.
    pub rate_per_unit: Decimal,
    /// Attendance adjustment between 0 and 1.
    pub attendance_factor: Decimal,
    /// Hours taught in the period, for hours-based lines.
    pub hours_taught: Option<Decimal>,
    /// The formula `total_amount` was computed with.
    pub earnings_basis: EarningsBasis,
    /// Amount paid for this unit.
    pub total_amount: Decimal,
}

/// A payroll record together with all of its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollDetail {
    /// The payroll record.
    pub record: PayrollRecord,
    /// Deduction lines, in insertion order.
    pub deduction_lines: Vec<PayrollDeductionLine>,
    /// Unit lines, in insertion order.
    pub unit_lines: Vec<PayrollUnitLine>,
}

impl PayrollDetail {
    /// Sum of the deduction line amounts.
    pub fn deduction_lines_total(&self) -> Decimal {
        self.deduction_lines.iter().map(|line| line.amount).sum()
    }

    /// Sum of the unit line totals.
    pub fn unit_lines_total(&self) -> Decimal {
        self.unit_lines.iter().map(|line| line.total_amount).sum()
    }

    /// Returns true when the stored totals match the persisted lines.
    pub fn is_consistent(&self) -> bool {
        self.record.deductions == self.deduction_lines_total()
            && self.record.unit_pay == self.unit_lines_total()
    }
}
