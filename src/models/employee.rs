//! Employee reference model.

use serde::{Deserialize, Serialize};

/// An employee that assignments and payroll records point at.
///
/// Profile data lives elsewhere; the engine only needs to know the employee
/// exists and what to call them in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: i64,
    /// Name shown in reports.
    pub display_name: String,
}
