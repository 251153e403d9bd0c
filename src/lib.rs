//! Faculty Payroll Engine
//!
//! This crate aggregates teaching attendance, computes teaching earnings and
//! attendance-based deductions, and assembles them into persisted payroll
//! records with an auditable trace of every calculation step.
//!
//! The pure pipeline lives in [`calculation`]; [`service::PayrollService`]
//! runs it against the SQLite [`store`] inside transactions.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
