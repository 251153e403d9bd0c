//! Configuration loading and management for the payroll engine.
//!
//! This module loads the attendance deduction policy and the payroll
//! creation defaults from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Late allowance: {}", config.deductions().allowed_late_per_period);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DeductionPolicy, EngineConfig, PayrollDefaults};
