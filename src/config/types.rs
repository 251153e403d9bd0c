//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{PaymentMethod, PayrollStatus};

/// Attendance-based deduction policy from deductions.yaml.
///
/// # Example
///
/// ```
/// use payroll_engine::config::DeductionPolicy;
/// use rust_decimal::Decimal;
///
/// let policy = DeductionPolicy::default();
/// assert_eq!(policy.absence_rate, Decimal::from(100));
/// assert_eq!(policy.allowed_late_per_period, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionPolicy {
    /// Amount deducted per absent day.
    pub absence_rate: Decimal,
    /// Amount deducted per late day beyond the allowance.
    pub late_rate: Decimal,
    /// Late days tolerated in one period before deductions start.
    pub allowed_late_per_period: u32,
}

impl Default for DeductionPolicy {
    fn default() -> Self {
        Self {
            absence_rate: Decimal::from(100),
            late_rate: Decimal::from(25),
            allowed_late_per_period: 2,
        }
    }
}

/// Defaults applied to new payroll records, from payroll.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollDefaults {
    /// Status a payroll is created in when the caller does not choose one.
    pub initial_status: PayrollStatus,
    /// Payment method used when the caller does not choose one.
    pub default_payment_method: PaymentMethod,
    /// ISO currency code amounts are expressed in.
    pub currency: String,
}

impl Default for PayrollDefaults {
    fn default() -> Self {
        Self {
            initial_status: PayrollStatus::Draft,
            default_payment_method: PaymentMethod::DirectDeposit,
            currency: "USD".to_string(),
        }
    }
}

/// The complete engine configuration loaded from YAML files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// Attendance deduction policy.
    deductions: DeductionPolicy,
    /// Payroll creation defaults.
    payroll: PayrollDefaults,
}

impl EngineConfig {
    /// Creates a new EngineConfig from its component parts.
    pub fn new(deductions: DeductionPolicy, payroll: PayrollDefaults) -> Self {
        Self {
            deductions,
            payroll,
        }
    }

    /// Returns the deduction policy.
    pub fn deductions(&self) -> &DeductionPolicy {
        &self.deductions
    }

    /// Returns the payroll defaults.
    pub fn payroll(&self) -> &PayrollDefaults {
        &self.payroll
    }
}
