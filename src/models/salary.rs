//! Salary record model.
//!
//! Salary records describe an employee's contracted pay outside the
//! attendance pipeline. The salary active at the end of a pay period
//! suggests the period's base pay.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::round_money;
use crate::error::{EngineError, EngineResult};

use super::PayPeriod;

/// How the salary amount is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    /// Per year.
    Annual,
    /// Per month.
    Monthly,
    /// Per hour.
    Hourly,
    /// Fixed contract sum.
    Contract,
    /// Per semester.
    Stipend,
}

impl_text_enum!(SalaryType, "salary type", {
    Annual => "annual",
    Monthly => "monthly",
    Hourly => "hourly",
    Contract => "contract",
    Stipend => "stipend",
});

/// The employment contract behind a salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    /// Full-time staff.
    FullTime,
    /// Part-time staff.
    PartTime,
    /// Adjunct faculty.
    Adjunct,
    /// Temporary staff.
    Temporary,
}

impl_text_enum!(ContractType, "contract type", {
    FullTime => "full_time",
    PartTime => "part_time",
    Adjunct => "adjunct",
    Temporary => "temporary",
});

/// Paid hours per year for a full-time hourly contract.
pub const FULL_TIME_HOURS_PER_YEAR: u32 = 1440;

/// Paid hours per year for any other hourly contract.
pub const PART_TIME_HOURS_PER_YEAR: u32 = 720;

/// Days a yearly amount is spread over when prorating.
pub const DAYS_PER_YEAR: u32 = 365;

/// Academic year label for a date. Years start in August.
///
/// # Examples
///
/// ```
/// use payroll_engine::models::academic_year_for;
/// use chrono::NaiveDate;
///
/// assert_eq!(academic_year_for(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()), "2024-2025");
/// assert_eq!(academic_year_for(NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()), "2024-2025");
/// ```
pub fn academic_year_for(date: NaiveDate) -> String {
    let start = if date.month() >= 8 { date.year() } else { date.year() - 1 };
    format!("{}-{}", start, start + 1)
}

/// A salary agreement for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// Unique identifier.
    pub id: i64,
    /// The employee the salary belongs to.
    pub employee_id: i64,
    /// The amount, in the unit given by `salary_type`.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// First day the salary applies.
    pub effective_date: NaiveDate,
    /// Last day the salary applies, if it has ended.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// How the amount is expressed.
    pub salary_type: SalaryType,
    /// The contract behind the salary.
    pub contract_type: ContractType,
    /// Academic year label, e.g. "2024-2025".
    #[serde(default)]
    pub academic_year: Option<String>,
    /// The user who recorded the salary.
    pub created_by: i64,
    /// When the salary was recorded.
    pub created_at: DateTime<Utc>,
}

impl SalaryRecord {
    /// Returns true when the salary has no end date or ends on or after `on`.
    pub fn is_active(&self, on: NaiveDate) -> bool {
        self.end_date.is_none_or(|end| end >= on)
    }

    /// Converts the amount to a yearly figure.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::{ContractType, SalaryRecord, SalaryType};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let salary = SalaryRecord {
    ///     id: 1,
    ///     employee_id: 1,
    ///     amount: Decimal::from(30),
    ///     currency: "USD".to_string(),
    ///     effective_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
    ///     end_date: None,
    ///     salary_type: SalaryType::Hourly,
    ///     contract_type: ContractType::Adjunct,
    ///     academic_year: None,
    ///     created_by: 1,
    ///     created_at: chrono::Utc::now(),
    /// };
    /// assert_eq!(salary.annualized_amount(), Decimal::from(21600));
    /// ```
    pub fn annualized_amount(&self) -> Decimal {
        let full_time = self.contract_type == ContractType::FullTime;
        match self.salary_type {
            SalaryType::Hourly if full_time => self.amount * Decimal::from(FULL_TIME_HOURS_PER_YEAR),
            SalaryType::Hourly => self.amount * Decimal::from(PART_TIME_HOURS_PER_YEAR),
            SalaryType::Monthly if full_time => self.amount * Decimal::from(12),
            SalaryType::Monthly => self.amount * Decimal::from(10),
            SalaryType::Stipend => self.amount * Decimal::from(2),
            SalaryType::Annual | SalaryType::Contract => self.amount,
        }
    }

    /// Base pay for `period`: the yearly figure prorated by the period's days.
    pub fn base_pay_for(&self, period: &PayPeriod) -> Decimal {
        let days = Decimal::from(period.days());
        round_money(self.annualized_amount() * days / Decimal::from(DAYS_PER_YEAR))
    }
}

/// Input for recording a salary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSalaryRecord {
    /// The employee the salary belongs to.
    pub employee_id: i64,
    /// The amount, in the unit given by `salary_type`.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// First day the salary applies.
    pub effective_date: NaiveDate,
    /// How the amount is expressed.
    pub salary_type: SalaryType,
    /// The contract behind the salary.
    pub contract_type: ContractType,
    /// The user recording the salary.
    pub created_by: i64,
}

impl NewSalaryRecord {
    /// Checks the amount and currency.
    pub fn validate(&self) -> EngineResult<()> {
        if self.amount < Decimal::ZERO {
            return Err(EngineError::validation("amount", "must not be negative"));
        }
        let currency = self.currency.trim();
        if currency.is_empty() || currency.len() > 10 {
            return Err(EngineError::validation(
                "currency",
                "must be between 1 and 10 characters",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn salary(amount: &str, salary_type: SalaryType, contract_type: ContractType) -> SalaryRecord {
        SalaryRecord {
            id: 1,
            employee_id: 1,
            amount: dec(amount),
            currency: "USD".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            end_date: None,
            salary_type,
            contract_type,
            academic_year: Some("2024-2025".to_string()),
            created_by: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hourly_annualization_depends_on_contract() {
        assert_eq!(
            salary("25", SalaryType::Hourly, ContractType::FullTime).annualized_amount(),
            dec("36000")
        );
        assert_eq!(
            salary("25", SalaryType::Hourly, ContractType::PartTime).annualized_amount(),
            dec("18000")
        );
    }

    #[test]
    fn test_monthly_annualization_depends_on_contract() {
        assert_eq!(
            salary("3000", SalaryType::Monthly, ContractType::FullTime).annualized_amount(),
            dec("36000")
        );
        assert_eq!(
            salary("3000", SalaryType::Monthly, ContractType::Temporary).annualized_amount(),
            dec("30000")
        );
    }

    #[test]
    fn test_stipend_annual_and_contract() {
        assert_eq!(
            salary("4000", SalaryType::Stipend, ContractType::Adjunct).annualized_amount(),
            dec("8000")
        );
        assert_eq!(
            salary("52000", SalaryType::Annual, ContractType::FullTime).annualized_amount(),
            dec("52000")
        );
        assert_eq!(
            salary("9000", SalaryType::Contract, ContractType::Temporary).annualized_amount(),
            dec("9000")
        );
    }

    #[test]
    fn test_is_active_respects_end_date() {
        let mut record = salary("52000", SalaryType::Annual, ContractType::FullTime);
        let day = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert!(record.is_active(day));

        record.end_date = Some(day);
        assert!(record.is_active(day));
        assert!(!record.is_active(day.succ_opt().unwrap()));
    }

    /// SA-001: a 31-day period of a 36500 yearly salary pays 3100
    #[test]
    fn test_base_pay_prorates_by_days() {
        let march = PayPeriod::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap();

        assert_eq!(
            salary("36500", SalaryType::Annual, ContractType::FullTime).base_pay_for(&march),
            dec("3100")
        );
        assert_eq!(
            salary("3000", SalaryType::Monthly, ContractType::FullTime).base_pay_for(&march),
            dec("3057.53")
        );
    }

    #[test]
    fn test_academic_year_starts_in_august() {
        let july = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        assert_eq!(academic_year_for(july), "2024-2025");
        assert_eq!(academic_year_for(july.succ_opt().unwrap()), "2025-2026");
    }

    #[test]
    fn test_new_salary_validation() {
        let mut new = NewSalaryRecord {
            employee_id: 1,
            amount: dec("52000"),
            currency: "USD".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            salary_type: SalaryType::Annual,
            contract_type: ContractType::FullTime,
            created_by: 1,
        };
        assert!(new.validate().is_ok());

        new.currency = "  ".to_string();
        assert!(new.validate().unwrap_err().is_validation());

        new.currency = "USD".to_string();
        new.amount = dec("-1");
        assert!(new.validate().unwrap_err().is_validation());
    }
}
