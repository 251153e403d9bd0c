//! Attendance record store.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, Employee, NewAttendanceRecord, PayPeriod};

use super::{decimal_column, enum_column};

fn record_from_row(row: &SqliteRow) -> EngineResult<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        assignment_id: row.try_get("assignment_id")?,
        date: row.try_get("date")?,
        status: enum_column(row, "status")?,
        hours: decimal_column(row, "hours")?,
        notes: row.try_get("notes")?,
        recorded_by: row.try_get("recorded_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn report_row_from_row(row: &SqliteRow) -> EngineResult<(Employee, AttendanceRecord)> {
    let employee = Employee {
        id: row.try_get("employee_id")?,
        display_name: row.try_get("display_name")?,
    };
    Ok((employee, record_from_row(row)?))
}

/// Inserts a validated attendance record.
pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewAttendanceRecord,
) -> EngineResult<AttendanceRecord> {
    new.validate()?;
    let created_at = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO attendance_record (assignment_id, date, status, hours, notes, recorded_by, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
    )
    .bind(new.assignment_id)
    .bind(new.date)
    .bind(new.status.as_str())
    .bind(new.hours.to_string())
    .bind(&new.notes)
    .bind(new.recorded_by)
    .bind(created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(AttendanceRecord {
        id,
        assignment_id: new.assignment_id,
        date: new.date,
        status: new.status,
        hours: new.hours,
        notes: new.notes.clone(),
        recorded_by: new.recorded_by,
        created_at,
    })
}

/// Deletes a record. Fails with `NotFound` when it does not exist.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> EngineResult<()> {
    let result = sqlx::query("DELETE FROM attendance_record WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(EngineError::NotFound {
            entity: "attendance record",
            id,
        });
    }
    Ok(())
}

/// Every record of one assignment, oldest first.
pub async fn list_for_assignment(
    conn: &mut SqliteConnection,
    assignment_id: i64,
) -> EngineResult<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        "SELECT id, assignment_id, date, status, hours, notes, recorded_by, created_at FROM attendance_record WHERE assignment_id = ? ORDER BY date, id",
    )
    .bind(assignment_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Records of all of an employee's assignments dated inside `period`.
pub async fn list_for_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
    period: &PayPeriod,
) -> EngineResult<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        "SELECT r.id, r.assignment_id, r.date, r.status, r.hours, r.notes, r.recorded_by, r.created_at FROM attendance_record r JOIN teaching_assignment a ON a.id = r.assignment_id WHERE a.employee_id = ?1 AND r.date BETWEEN ?2 AND ?3 ORDER BY r.date, r.id",
    )
    .bind(employee_id)
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Records in `period` joined with their employee, newest first.
///
/// `employee_id` and `assignment_id` narrow the rows when given.
pub async fn list_with_employee(
    conn: &mut SqliteConnection,
    period: &PayPeriod,
    employee_id: Option<i64>,
    assignment_id: Option<i64>,
) -> EngineResult<Vec<(Employee, AttendanceRecord)>> {
    let rows = sqlx::query(
        "SELECT r.id, r.assignment_id, r.date, r.status, r.hours, r.notes, r.recorded_by, r.created_at, e.id AS employee_id, e.display_name FROM attendance_record r JOIN teaching_assignment a ON a.id = r.assignment_id JOIN employee e ON e.id = a.employee_id WHERE r.date BETWEEN ?1 AND ?2 AND (?3 IS NULL OR e.id = ?3) AND (?4 IS NULL OR r.assignment_id = ?4) ORDER BY r.date DESC, r.id DESC",
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .bind(employee_id)
    .bind(assignment_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(report_row_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, AttendanceStatus, NewTeachingAssignment};
    use crate::store::{Database, assignments, employees};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    async fn seed(conn: &mut SqliteConnection) -> (i64, i64) {
        let employee = employees::insert(conn, "Ana Cruz").await.unwrap();
        let assignment = assignments::insert(
            conn,
            &NewTeachingAssignment {
                employee_id: employee.id,
                title: "Algebra".to_string(),
                code: None,
                academic_term: "2025 Spring".to_string(),
                start_date: date(3, 1),
                end_date: date(4, 30),
                hours_per_week: Decimal::new(3, 0),
                unit_value: Decimal::new(3, 0),
                rate_per_unit: Decimal::new(40, 0),
                status: None,
                created_by: 1,
            },
            AssignmentStatus::Active,
        )
        .await
        .unwrap();
        (employee.id, assignment.id)
    }

    fn new_record(assignment_id: i64, on: NaiveDate, status: AttendanceStatus) -> NewAttendanceRecord {
        NewAttendanceRecord {
            assignment_id,
            date: on,
            status,
            hours: Decimal::new(15, 1),
            notes: Some("Room 4".to_string()),
            recorded_by: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_for_assignment() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let (_, assignment_id) = seed(&mut conn).await;

        let created = insert(&mut conn, &new_record(assignment_id, date(3, 3), AttendanceStatus::Late))
            .await
            .unwrap();
        let listed = list_for_assignment(&mut conn, assignment_id).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].hours, Decimal::new(15, 1));
        assert_eq!(listed[0].status, AttendanceStatus::Late);
        assert_eq!(listed[0].notes.as_deref(), Some("Room 4"));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_hours() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let (_, assignment_id) = seed(&mut conn).await;

        let mut record = new_record(assignment_id, date(3, 3), AttendanceStatus::Present);
        record.hours = Decimal::new(13, 0);

        assert!(insert(&mut conn, &record).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_list_for_employee_filters_window() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let (employee_id, assignment_id) = seed(&mut conn).await;

        for on in [date(3, 1), date(3, 31), date(4, 1)] {
            insert(&mut conn, &new_record(assignment_id, on, AttendanceStatus::Present))
                .await
                .unwrap();
        }

        let march = PayPeriod::new(date(3, 1), date(3, 31)).unwrap();
        let records = list_for_employee(&mut conn, employee_id, &march).await.unwrap();
        assert_eq!(records.len(), 2);

        let other = list_for_employee(&mut conn, employee_id + 1, &march).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_employee_is_newest_first() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let (employee_id, assignment_id) = seed(&mut conn).await;

        insert(&mut conn, &new_record(assignment_id, date(3, 3), AttendanceStatus::Present))
            .await
            .unwrap();
        insert(&mut conn, &new_record(assignment_id, date(3, 10), AttendanceStatus::Absent))
            .await
            .unwrap();

        let march = PayPeriod::new(date(3, 1), date(3, 31)).unwrap();
        let rows = list_with_employee(&mut conn, &march, Some(employee_id), None)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.display_name, "Ana Cruz");
        assert_eq!(rows[0].1.date, date(3, 10));
    }

    #[tokio::test]
    async fn test_delete_missing_record() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(delete(&mut conn, 77).await.unwrap_err().is_not_found());
    }
}
