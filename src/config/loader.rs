//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration from YAML files.

use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{DeductionPolicy, EngineConfig, PayrollDefaults};

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── deductions.yaml  # Attendance deduction policy
/// └── payroll.yaml     # Payroll creation defaults
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Absence rate: {}", loader.deductions().absence_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A rate is negative or the initial status is not `draft` or `pending`
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let deductions_path = path.join("deductions.yaml");
        let deductions = Self::load_yaml::<DeductionPolicy>(&deductions_path)?;
        Self::check_rate(&deductions_path, "absence_rate", deductions.absence_rate)?;
        Self::check_rate(&deductions_path, "late_rate", deductions.late_rate)?;

        let payroll_path = path.join("payroll.yaml");
        let payroll = Self::load_yaml::<PayrollDefaults>(&payroll_path)?;
        if !payroll.initial_status.is_initial() {
            return Err(EngineError::ConfigParseError {
                path: payroll_path.display().to_string(),
                message: format!(
                    "initial_status must be draft or pending, got {}",
                    payroll.initial_status
                ),
            });
        }

        Ok(Self {
            config: EngineConfig::new(deductions, payroll),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn check_rate(path: &Path, field: &str, value: Decimal) -> EngineResult<()> {
        if value < Decimal::ZERO {
            return Err(EngineError::ConfigParseError {
                path: path.display().to_string(),
                message: format!("{field} must not be negative, got {value}"),
            });
        }
        Ok(())
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// Returns the deduction policy.
    pub fn deductions(&self) -> &DeductionPolicy {
        self.config.deductions()
    }

    /// Returns the payroll defaults.
    pub fn payroll(&self) -> &PayrollDefaults {
        self.config.payroll()
    }
}
