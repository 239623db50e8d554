//! Check result types recorded in the quality log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CheckType;

/// The audited outcome of a rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// The rule found no violating rows.
    Pass,
    /// The rule found at least one violating row.
    Fail,
}

impl CheckStatus {
    /// Returns the label written to the quality log (`PASS` / `FAIL`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
        }
    }

    /// Returns true if this is a Fail status.
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckStatus::Fail)
    }
}

/// The result of evaluating one quality rule against one table.
///
/// Created once per rule execution and immutable once written: results are
/// appended to the quality log and never updated or deleted by this crate.
///
/// Invariants upheld by the runner: `status` is `Fail` exactly when
/// `failed_record_count > 0`, and `failed_record_count <= record_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// The kind of rule that produced this result
    pub check_type: CheckType,
    /// The table that was validated
    pub table_name: String,
    /// Pass/fail outcome
    pub status: CheckStatus,
    /// Evaluation time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Total rows scanned, unfiltered
    pub record_count: u64,
    /// Rows violating the rule
    pub failed_record_count: u64,
    /// Deterministic, comma-joined aggregation of offending values or keys.
    /// `None` when the check passed.
    pub failed_record_summary: Option<String>,
}

impl CheckResult {
    /// Returns true if the check passed.
    pub fn passed(&self) -> bool {
        matches!(self.status, CheckStatus::Pass)
    }
}
