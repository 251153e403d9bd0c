//! Audit trace models for the payroll engine.
//!
//! Every pipeline stage records an [`AuditStep`] describing its input, its
//! output and how it got there, so an assembled payroll can be explained line
//! by line to the reporting side.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// How serious an [`AuditWarning`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Informational.
    Low,
    /// Worth a look before approval.
    Medium,
    /// Likely wrong.
    High,
}

/// A warning generated during assembly.
///
/// Warnings indicate potential issues that don't prevent the payroll from
/// being created but may require attention, such as an overlapping period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level.
    pub severity: WarningSeverity,
}

/// The complete audit trace for one assembly.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// assert!(!trace.has_warnings());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during assembly.
    pub warnings: Vec<AuditWarning>,
    /// The total assembly duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// The number the next recorded step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Appends a warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, severity: WarningSeverity) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message: message.into(),
            severity,
        });
    }

    /// Returns true when at least one warning was recorded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_step(step_number: u32) -> AuditStep {
        AuditStep {
            step_number,
            rule_id: "attendance_aggregation".to_string(),
            rule_name: "Attendance Aggregation".to_string(),
            input: serde_json::json!({"assignments": 2}),
            output: serde_json::json!({"total": 10}),
            reasoning: "10 records in range".to_string(),
        }
    }

    #[test]
    fn test_next_step_number_follows_recorded_steps() {
        let mut trace = AuditTrace::default();
        assert_eq!(trace.next_step_number(), 1);
        trace.steps.push(sample_step(1));
        trace.steps.push(sample_step(2));
        assert_eq!(trace.next_step_number(), 3);
    }

    #[test]
    fn test_warn_records_warning() {
        let mut trace = AuditTrace::default();
        trace.warn("DUPLICATE_PERIOD", "Overlaps payroll 4", WarningSeverity::Medium);

        assert!(trace.has_warnings());
        assert_eq!(trace.warnings[0].code, "DUPLICATE_PERIOD");
        assert_eq!(trace.warnings[0].severity, WarningSeverity::Medium);
    }

    #[test]
    fn test_audit_trace_serialization() {
        let mut trace = AuditTrace {
            steps: vec![sample_step(1)],
            warnings: vec![],
            duration_us: 1000,
        };
        trace.warn("DUPLICATE_PERIOD", "Overlaps payroll 4", WarningSeverity::High);

        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"rule_id\":\"attendance_aggregation\""));
        assert!(json.contains("\"severity\":\"high\""));

        let parsed: AuditTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, trace);
    }
}
