//! SQLite persistence.
//!
//! Every store function takes a `&mut SqliteConnection`, so the same call
//! works on a pooled connection or inside an open transaction. Decimals are
//! stored as TEXT and parsed back exactly; dates are ISO TEXT.

pub mod assignments;
pub mod attendance;
pub mod employees;
pub mod payroll;
pub mod salary;

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::error::{EngineError, EngineResult};

/// Owns the SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if missing) the database at `url` and applies migrations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use payroll_engine::store::Database;
    ///
    /// # async fn open() -> payroll_engine::error::EngineResult<()> {
    /// let db = Database::connect("sqlite://payroll.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> EngineResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!(url, "Database connection established");
        Self::migrate(pool).await
    }

    /// Opens a private in-memory database with migrations applied.
    ///
    /// The pool holds a single connection that never expires, since each
    /// in-memory connection is its own database.
    pub async fn connect_in_memory() -> EngineResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> EngineResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Reads a TEXT column holding an exact decimal.
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> EngineResult<Decimal> {
    let text: String = row.try_get(column)?;
    parse_decimal(column, &text)
}

/// Reads a nullable TEXT column holding an exact decimal.
pub(crate) fn optional_decimal_column(
    row: &SqliteRow,
    column: &str,
) -> EngineResult<Option<Decimal>> {
    let text: Option<String> = row.try_get(column)?;
    text.map(|text| parse_decimal(column, &text)).transpose()
}

/// Reads a TEXT column holding one of the engine's text enums.
pub(crate) fn enum_column<T>(row: &SqliteRow, column: &str) -> EngineResult<T>
where
    T: FromStr<Err = EngineError>,
{
    let text: String = row.try_get(column)?;
    text.parse()
}

/// Reads a nullable TEXT column holding one of the engine's text enums.
pub(crate) fn optional_enum_column<T>(row: &SqliteRow, column: &str) -> EngineResult<Option<T>>
where
    T: FromStr<Err = EngineError>,
{
    let text: Option<String> = row.try_get(column)?;
    text.map(|text| text.parse()).transpose()
}

fn parse_decimal(column: &str, text: &str) -> EngineResult<Decimal> {
    Decimal::from_str(text).map_err(|e| EngineError::Persistence {
        message: format!("column {column} holds '{text}', not a decimal: {e}"),
    })
}
