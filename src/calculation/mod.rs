//! Calculation logic for the payroll engine.
//!
//! This module contains the pure pipeline stages: attendance aggregation,
//! teaching earnings, the attendance deduction policy, weighted attendance,
//! and payroll assembly. None of them touch storage.

mod attendance_deductions;
mod attendance_stats;
mod payroll_assembly;
mod rounding;
mod teaching_earnings;
mod weighted_attendance;

pub use attendance_deductions::{
    AttendanceDeductions, AttendanceDeductionsResult, calculate_attendance_deductions,
};
pub use attendance_stats::{
    AttendanceStats, AttendanceStatsResult, StatusCounts, aggregate_attendance,
};
pub use payroll_assembly::{
    AssembledPayroll, AssemblyInput, AssignmentPayroll, assemble_from_assignment, assemble_payroll,
};
pub use rounding::{FACTOR_DP, MONEY_DP, percentage, round_factor, round_money};
pub use teaching_earnings::{
    TeachingEarnings, TeachingEarningsResult, UnitEarnings, calculate_teaching_earnings,
};
pub use weighted_attendance::{
    AttendanceHoursSummary, EmployeeHours, HoursBreakdown, ReportRow, mean_attendance_weight,
    summarize_attendance_hours, weighted_attendance_factor, weighted_attendance_rate,
};
