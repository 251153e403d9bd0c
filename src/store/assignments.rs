//! Teaching assignment store, including the relationship edge list.

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AssignmentRelationship, AssignmentStatus, NewTeachingAssignment, RelationshipType,
    TeachingAssignment,
};

use super::{decimal_column, enum_column};

const COLUMNS: &str = "id, employee_id, title, code, academic_term, start_date, end_date, hours_per_week, unit_value, rate_per_unit, status, created_by, created_at, updated_at";

fn assignment_from_row(row: &SqliteRow) -> EngineResult<TeachingAssignment> {
    Ok(TeachingAssignment {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        title: row.try_get("title")?,
        code: row.try_get("code")?,
        academic_term: row.try_get("academic_term")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        hours_per_week: decimal_column(row, "hours_per_week")?,
        unit_value: decimal_column(row, "unit_value")?,
        rate_per_unit: decimal_column(row, "rate_per_unit")?,
        status: enum_column(row, "status")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn relationship_from_row(row: &SqliteRow) -> EngineResult<AssignmentRelationship> {
    Ok(AssignmentRelationship {
        source_id: row.try_get("source_id")?,
        target_id: row.try_get("target_id")?,
        relationship_type: enum_column(row, "relationship_type")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts an assignment with the given status.
pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewTeachingAssignment,
    status: AssignmentStatus,
) -> EngineResult<TeachingAssignment> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO teaching_assignment (employee_id, title, code, academic_term, start_date, end_date, hours_per_week, unit_value, rate_per_unit, status, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12) RETURNING id",
    )
    .bind(new.employee_id)
    .bind(&new.title)
    .bind(&new.code)
    .bind(&new.academic_term)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.hours_per_week.to_string())
    .bind(new.unit_value.to_string())
    .bind(new.rate_per_unit.to_string())
    .bind(status.as_str())
    .bind(new.created_by)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    require(conn, id).await
}

/// Loads an assignment by id.
pub async fn find(conn: &mut SqliteConnection, id: i64) -> EngineResult<Option<TeachingAssignment>> {
    let row = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM teaching_assignment WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(assignment_from_row).transpose()
}

/// Fails with `NotFound` unless the assignment exists.
pub async fn require(conn: &mut SqliteConnection, id: i64) -> EngineResult<TeachingAssignment> {
    find(conn, id).await?.ok_or(EngineError::NotFound {
        entity: "assignment",
        id,
    })
}

/// Lists an employee's assignments ordered by id, optionally by status.
pub async fn list_for_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
    status: Option<AssignmentStatus>,
) -> EngineResult<Vec<TeachingAssignment>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM teaching_assignment WHERE employee_id = ?1 AND (?2 IS NULL OR status = ?2) ORDER BY id"
    ))
    .bind(employee_id)
    .bind(status.map(AssignmentStatus::as_str))
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(assignment_from_row).collect()
}

/// Sets an assignment's status. Returns false when the assignment does not exist.
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: AssignmentStatus,
) -> EngineResult<bool> {
    let result =
        sqlx::query("UPDATE teaching_assignment SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Re-derives the status of every non-cancelled assignment for `today`.
///
/// Returns the number of assignments whose status changed.
pub async fn refresh_statuses(conn: &mut SqliteConnection, today: NaiveDate) -> EngineResult<u64> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM teaching_assignment WHERE status <> 'cancelled'"
    ))
    .fetch_all(&mut *conn)
    .await?;

    let mut changed = 0;
    for row in &rows {
        let assignment = assignment_from_row(row)?;
        let derived = assignment.derive_status(today);
        if derived != assignment.status {
            update_status(conn, assignment.id, derived).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// Adds a typed edge between two assignments.
///
/// Returns false when the pair is already linked. Self-links are rejected.
pub async fn link(
    conn: &mut SqliteConnection,
    source_id: i64,
    target_id: i64,
    relationship_type: RelationshipType,
) -> EngineResult<bool> {
    if source_id == target_id {
        return Err(EngineError::validation(
            "target_id",
            "an assignment cannot be linked to itself",
        ));
    }
    require(conn, source_id).await?;
    require(conn, target_id).await?;

    let result = sqlx::query(
        "INSERT OR IGNORE INTO assignment_relationship (source_id, target_id, relationship_type, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(source_id)
    .bind(target_id)
    .bind(relationship_type.as_str())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes the edge from `source_id` to `target_id`. Returns false when absent.
pub async fn unlink(conn: &mut SqliteConnection, source_id: i64, target_id: i64) -> EngineResult<bool> {
    let result =
        sqlx::query("DELETE FROM assignment_relationship WHERE source_id = ?1 AND target_id = ?2")
            .bind(source_id)
            .bind(target_id)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// Lists edges touching an assignment in either direction.
pub async fn relationships(
    conn: &mut SqliteConnection,
    assignment_id: i64,
) -> EngineResult<Vec<AssignmentRelationship>> {
    let rows = sqlx::query(
        "SELECT source_id, target_id, relationship_type, created_at FROM assignment_relationship WHERE source_id = ?1 OR target_id = ?1 ORDER BY source_id, target_id",
    )
    .bind(assignment_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(relationship_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, employees};
    use rust_decimal::Decimal;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn new_assignment(employee_id: i64, title: &str, start: NaiveDate, end: NaiveDate) -> NewTeachingAssignment {
        NewTeachingAssignment {
            employee_id,
            title: title.to_string(),
            code: Some("MATH101".to_string()),
            academic_term: "2025 Spring".to_string(),
            start_date: start,
            end_date: end,
            hours_per_week: Decimal::new(3, 0),
            unit_value: Decimal::new(3, 0),
            rate_per_unit: Decimal::new(4550, 2),
            status: None,
            created_by: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_preserves_decimals_and_dates() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let employee = employees::insert(&mut conn, "Ana Cruz").await.unwrap();

        let created = insert(
            &mut conn,
            &new_assignment(employee.id, "Algebra", date(3, 1), date(3, 31)),
            AssignmentStatus::Active,
        )
        .await
        .unwrap();

        assert_eq!(created.rate_per_unit, Decimal::new(4550, 2));
        assert_eq!(created.start_date, date(3, 1));
        assert_eq!(created.status, AssignmentStatus::Active);
        assert_eq!(created.code.as_deref(), Some("MATH101"));
    }

    #[tokio::test]
    async fn test_list_for_employee_filters_status() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let employee = employees::insert(&mut conn, "Ana Cruz").await.unwrap();

        let active = new_assignment(employee.id, "Algebra", date(3, 1), date(3, 31));
        insert(&mut conn, &active, AssignmentStatus::Active).await.unwrap();
        insert(&mut conn, &active, AssignmentStatus::Completed).await.unwrap();

        let all = list_for_employee(&mut conn, employee.id, None).await.unwrap();
        let only_active = list_for_employee(&mut conn, employee.id, Some(AssignmentStatus::Active))
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(only_active.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_keeps_cancelled_sticky() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let employee = employees::insert(&mut conn, "Ana Cruz").await.unwrap();

        let window = new_assignment(employee.id, "Algebra", date(3, 1), date(3, 31));
        let running = insert(&mut conn, &window, AssignmentStatus::Pending).await.unwrap();
        let cancelled = insert(&mut conn, &window, AssignmentStatus::Cancelled).await.unwrap();

        let changed = refresh_statuses(&mut conn, date(3, 15)).await.unwrap();

        assert_eq!(changed, 1);
        assert_eq!(require(&mut conn, running.id).await.unwrap().status, AssignmentStatus::Active);
        assert_eq!(
            require(&mut conn, cancelled.id).await.unwrap().status,
            AssignmentStatus::Cancelled
        );

        refresh_statuses(&mut conn, date(4, 1)).await.unwrap();
        assert_eq!(
            require(&mut conn, running.id).await.unwrap().status,
            AssignmentStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_link_rules() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let employee = employees::insert(&mut conn, "Ana Cruz").await.unwrap();

        let window = new_assignment(employee.id, "Algebra", date(3, 1), date(3, 31));
        let a = insert(&mut conn, &window, AssignmentStatus::Active).await.unwrap();
        let b = insert(&mut conn, &window, AssignmentStatus::Active).await.unwrap();

        assert!(link(&mut conn, a.id, a.id, RelationshipType::Related).await.unwrap_err().is_validation());
        assert!(link(&mut conn, a.id, 999, RelationshipType::Related).await.unwrap_err().is_not_found());

        assert!(link(&mut conn, a.id, b.id, RelationshipType::Prerequisite).await.unwrap());
        assert!(!link(&mut conn, a.id, b.id, RelationshipType::Related).await.unwrap());
        assert!(link(&mut conn, b.id, a.id, RelationshipType::Corequisite).await.unwrap());

        let edges = relationships(&mut conn, a.id).await.unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].relationship_type, RelationshipType::Prerequisite);

        assert!(unlink(&mut conn, a.id, b.id).await.unwrap());
        assert!(!unlink(&mut conn, a.id, b.id).await.unwrap());
        assert_eq!(relationships(&mut conn, a.id).await.unwrap().len(), 1);
    }
}
