//! Payroll service.
//!
//! [`PayrollService`] ties the pure calculation pipeline to the SQLite store.
//! Every operation that writes more than one row runs in a single
//! transaction, and a failure at any step rolls all of it back.
//!
//! Each operation logs with a fresh `operation_id` so the lines of one call
//! can be correlated.

mod directory;
mod payroll;
mod reporting;
mod request;
mod salary;

pub use request::{
    AssignmentPayrollCreated, AttendanceOverview, CreatePayrollRequest, PayrollCreated,
    PayrollUpdate,
};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::store::Database;

/// Payroll operations over a database and a loaded configuration.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::EngineConfig;
/// use payroll_engine::service::PayrollService;
/// use payroll_engine::store::Database;
///
/// # async fn run() -> payroll_engine::error::EngineResult<()> {
/// let db = Database::connect("sqlite://payroll.db").await?;
/// let service = PayrollService::new(db, EngineConfig::default());
/// let employee = service.add_employee("Ana Cruz").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PayrollService {
    db: Database,
    config: EngineConfig,
}

impl PayrollService {
    /// Creates a service over an open database.
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    /// Creates a service over a fresh in-memory database.
    pub async fn in_memory(config: EngineConfig) -> EngineResult<Self> {
        let db = Database::connect_in_memory().await?;
        Ok(Self::new(db, config))
    }

    /// Returns the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
