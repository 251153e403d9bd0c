//! Employees, teaching assignments and attendance records.
//!
//! Thin wrappers over the store that add validation, existence checks and
//! logging.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AssignmentRelationship, AssignmentStatus, AttendanceRecord, Employee, NewAttendanceRecord,
    NewTeachingAssignment, RelationshipType, TeachingAssignment,
};
use crate::store::{assignments, attendance, employees};

use super::PayrollService;

impl PayrollService {
    /// Registers an employee.
    pub async fn add_employee(&self, display_name: &str) -> EngineResult<Employee> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(EngineError::validation("display_name", "must not be empty"));
        }
        let mut conn = self.db.pool().acquire().await?;
        let employee = employees::insert(&mut conn, display_name).await?;
        info!(employee_id = employee.id, "Employee added");
        Ok(employee)
    }

    /// Creates a teaching assignment.
    ///
    /// Without an explicit status the assignment gets the status its dates
    /// imply today.
    pub async fn create_assignment(
        &self,
        new: NewTeachingAssignment,
    ) -> EngineResult<TeachingAssignment> {
        let operation_id = Uuid::new_v4();
        new.validate()?;
        let status = new.status.unwrap_or_else(|| {
            AssignmentStatus::for_dates(new.start_date, new.end_date, Utc::now().date_naive())
        });

        let mut tx = self.db.pool().begin().await?;
        employees::require(&mut tx, new.employee_id).await?;
        let assignment = assignments::insert(&mut tx, &new, status).await?;
        tx.commit().await?;

        info!(
            operation_id = %operation_id,
            assignment_id = assignment.id,
            employee_id = assignment.employee_id,
            status = %assignment.status,
            "Assignment created"
        );
        Ok(assignment)
    }

    /// Loads an assignment.
    pub async fn find_assignment(&self, assignment_id: i64) -> EngineResult<TeachingAssignment> {
        let mut conn = self.db.pool().acquire().await?;
        assignments::require(&mut conn, assignment_id).await
    }

    /// An employee's assignments, optionally narrowed to one status.
    pub async fn list_assignments(
        &self,
        employee_id: i64,
        status: Option<AssignmentStatus>,
    ) -> EngineResult<Vec<TeachingAssignment>> {
        let mut conn = self.db.pool().acquire().await?;
        assignments::list_for_employee(&mut conn, employee_id, status).await
    }

    /// Sets an assignment's status, including cancelling it.
    pub async fn update_assignment_status(
        &self,
        assignment_id: i64,
        status: AssignmentStatus,
    ) -> EngineResult<TeachingAssignment> {
        let mut tx = self.db.pool().begin().await?;
        if !assignments::update_status(&mut tx, assignment_id, status).await? {
            return Err(EngineError::NotFound {
                entity: "assignment",
                id: assignment_id,
            });
        }
        let assignment = assignments::require(&mut tx, assignment_id).await?;
        tx.commit().await?;

        info!(assignment_id, status = %status, "Assignment status updated");
        Ok(assignment)
    }

    /// Re-derives every non-cancelled assignment's status for `today`.
    ///
    /// Returns the number of assignments whose status changed.
    pub async fn refresh_assignment_statuses(&self, today: NaiveDate) -> EngineResult<u64> {
        let mut tx = self.db.pool().begin().await?;
        let changed = assignments::refresh_statuses(&mut tx, today).await?;
        tx.commit().await?;

        info!(today = %today, changed, "Assignment statuses refreshed");
        Ok(changed)
    }

    /// Links two assignments. Returns false when the link already existed.
    pub async fn link_assignments(
        &self,
        source_id: i64,
        target_id: i64,
        relationship_type: RelationshipType,
    ) -> EngineResult<bool> {
        let mut conn = self.db.pool().acquire().await?;
        let created = assignments::link(&mut conn, source_id, target_id, relationship_type)
            .await
            .inspect_err(|err| warn!(source_id, target_id, error = %err, "Rejected assignment link"))?;
        info!(source_id, target_id, created, "Assignments linked");
        Ok(created)
    }

    /// Removes a link. Returns false when there was none.
    pub async fn unlink_assignments(&self, source_id: i64, target_id: i64) -> EngineResult<bool> {
        let mut conn = self.db.pool().acquire().await?;
        assignments::unlink(&mut conn, source_id, target_id).await
    }

    /// Every edge touching an assignment.
    pub async fn assignment_relationships(
        &self,
        assignment_id: i64,
    ) -> EngineResult<Vec<AssignmentRelationship>> {
        let mut conn = self.db.pool().acquire().await?;
        assignments::relationships(&mut conn, assignment_id).await
    }

    /// Records attendance against an existing assignment.
    pub async fn record_attendance(
        &self,
        new: NewAttendanceRecord,
    ) -> EngineResult<AttendanceRecord> {
        new.validate()?;
        let mut tx = self.db.pool().begin().await?;
        assignments::require(&mut tx, new.assignment_id).await?;
        let record = attendance::insert(&mut tx, &new).await?;
        tx.commit().await?;

        info!(
            record_id = record.id,
            assignment_id = record.assignment_id,
            date = %record.date,
            status = %record.status,
            "Attendance recorded"
        );
        Ok(record)
    }

    /// Deletes an attendance record.
    pub async fn delete_attendance(&self, record_id: i64) -> EngineResult<()> {
        let mut conn = self.db.pool().acquire().await?;
        attendance::delete(&mut conn, record_id).await?;
        info!(record_id, "Attendance record deleted");
        Ok(())
    }
}
