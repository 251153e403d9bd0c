//! Salary store.

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::{EngineError, EngineResult};
use crate::models::{NewSalaryRecord, SalaryRecord, academic_year_for};

use super::{decimal_column, enum_column};

const COLUMNS: &str = "id, employee_id, amount, currency, effective_date, end_date, salary_type, contract_type, academic_year, created_by, created_at";

fn salary_from_row(row: &SqliteRow) -> EngineResult<SalaryRecord> {
    Ok(SalaryRecord {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        amount: decimal_column(row, "amount")?,
        currency: row.try_get("currency")?,
        effective_date: row.try_get("effective_date")?,
        end_date: row.try_get("end_date")?,
        salary_type: enum_column(row, "salary_type")?,
        contract_type: enum_column(row, "contract_type")?,
        academic_year: row.try_get("academic_year")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts an open salary, labelled with the academic year of its start.
pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewSalaryRecord,
) -> EngineResult<SalaryRecord> {
    new.validate()?;
    let created_at = Utc::now();
    let currency = new.currency.trim().to_uppercase();
    let academic_year = academic_year_for(new.effective_date);
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO salary (employee_id, amount, currency, effective_date, end_date, salary_type, contract_type, academic_year, created_by, created_at) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8, ?9) RETURNING id",
    )
    .bind(new.employee_id)
    .bind(new.amount.to_string())
    .bind(&currency)
    .bind(new.effective_date)
    .bind(new.salary_type.as_str())
    .bind(new.contract_type.as_str())
    .bind(&academic_year)
    .bind(new.created_by)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(SalaryRecord {
        id,
        employee_id: new.employee_id,
        amount: new.amount,
        currency,
        effective_date: new.effective_date,
        end_date: None,
        salary_type: new.salary_type,
        contract_type: new.contract_type,
        academic_year: Some(academic_year),
        created_by: new.created_by,
        created_at,
    })
}

/// The employee's salary without an end date, if any.
pub async fn find_open(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> EngineResult<Option<SalaryRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM salary WHERE employee_id = ? AND end_date IS NULL ORDER BY effective_date DESC, id DESC LIMIT 1"
    ))
    .bind(employee_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(salary_from_row).transpose()
}

/// Sets a salary's last day. Fails with `NotFound` when it does not exist.
pub async fn close(conn: &mut SqliteConnection, id: i64, end_date: NaiveDate) -> EngineResult<()> {
    let result = sqlx::query("UPDATE salary SET end_date = ?1 WHERE id = ?2")
        .bind(end_date)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(EngineError::NotFound {
            entity: "salary",
            id,
        });
    }
    Ok(())
}

/// The salary in force on `on`: started by then and not yet ended.
///
/// When several qualify, the latest start wins.
pub async fn active_on(
    conn: &mut SqliteConnection,
    employee_id: i64,
    on: NaiveDate,
) -> EngineResult<Option<SalaryRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM salary WHERE employee_id = ?1 AND effective_date <= ?2 AND (end_date IS NULL OR end_date >= ?2) ORDER BY effective_date DESC, id DESC LIMIT 1"
    ))
    .bind(employee_id)
    .bind(on)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(salary_from_row).transpose()
}

/// Every salary of the employee, latest start first.
pub async fn history(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> EngineResult<Vec<SalaryRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM salary WHERE employee_id = ? ORDER BY effective_date DESC, id DESC"
    ))
    .bind(employee_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(salary_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContractType, SalaryType};
    use crate::store::{Database, employees};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_salary(employee_id: i64, amount: i64, effective_date: NaiveDate) -> NewSalaryRecord {
        NewSalaryRecord {
            employee_id,
            amount: Decimal::from(amount),
            currency: "usd".to_string(),
            effective_date,
            salary_type: SalaryType::Annual,
            contract_type: ContractType::FullTime,
            created_by: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_labels_academic_year() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let employee = employees::insert(&mut conn, "Ana Cruz").await.unwrap();

        let created = insert(&mut conn, &new_salary(employee.id, 52000, date(2024, 9, 1)))
            .await
            .unwrap();
        let open = find_open(&mut conn, employee.id).await.unwrap().unwrap();

        assert_eq!(open.id, created.id);
        assert_eq!(open.currency, "USD");
        assert_eq!(open.academic_year.as_deref(), Some("2024-2025"));
        assert_eq!(open.amount, Decimal::from(52000));
    }

    #[tokio::test]
    async fn test_active_on_respects_window() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let employee = employees::insert(&mut conn, "Ana Cruz").await.unwrap();

        let first = insert(&mut conn, &new_salary(employee.id, 48000, date(2024, 1, 1)))
            .await
            .unwrap();
        close(&mut conn, first.id, date(2024, 12, 31)).await.unwrap();
        let second = insert(&mut conn, &new_salary(employee.id, 52000, date(2025, 1, 1)))
            .await
            .unwrap();

        let mid_2024 = active_on(&mut conn, employee.id, date(2024, 6, 30)).await.unwrap();
        assert_eq!(mid_2024.map(|s| s.id), Some(first.id));

        let mid_2025 = active_on(&mut conn, employee.id, date(2025, 6, 30)).await.unwrap();
        assert_eq!(mid_2025.map(|s| s.id), Some(second.id));

        let before = active_on(&mut conn, employee.id, date(2023, 12, 31)).await.unwrap();
        assert!(before.is_none());

        let ids: Vec<i64> = history(&mut conn, employee.id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_close_missing_salary() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(close(&mut conn, 42, date(2025, 1, 1)).await.unwrap_err().is_not_found());
    }
}
