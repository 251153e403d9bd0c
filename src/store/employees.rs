//! Employee store.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::{EngineError, EngineResult};
use crate::models::Employee;

fn employee_from_row(row: &SqliteRow) -> EngineResult<Employee> {
    Ok(Employee {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
    })
}

/// Inserts an employee.
pub async fn insert(conn: &mut SqliteConnection, display_name: &str) -> EngineResult<Employee> {
    let id: i64 = sqlx::query_scalar("INSERT INTO employee (display_name) VALUES (?) RETURNING id")
        .bind(display_name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Employee {
        id,
        display_name: display_name.to_string(),
    })
}

/// Loads an employee by id.
pub async fn find(conn: &mut SqliteConnection, id: i64) -> EngineResult<Option<Employee>> {
    let row = sqlx::query("SELECT id, display_name FROM employee WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(employee_from_row).transpose()
}

/// Fails with `NotFound` unless the employee exists.
pub async fn require(conn: &mut SqliteConnection, id: i64) -> EngineResult<Employee> {
    find(conn, id).await?.ok_or(EngineError::NotFound {
        entity: "employee",
        id,
    })
}
