//! Append-only persistence of check results.
//!
//! Every rule evaluation lands as one row in the quality-log table, schema
//! `(check_type, status, table_name, timestamp, record_count, failed_records,
//! error_details)`. Writes are insert-only, never upserts: re-evaluating the
//! same rule produces a new, individually timestamped row, and the store
//! carries no uniqueness constraint. Log rows are never updated or deleted
//! by this crate.

use tracing::{debug, instrument};

use crate::checks::CheckResult;
use crate::config::WarehouseConfig;
use crate::error::{Result, StagewardError};
use crate::executor::{QueryExecutor, StatementKind};
use crate::security::SqlSecurity;

/// Writes [`CheckResult`]s to the durable quality log.
///
/// The log table lives alongside the staging tables and is resolved through
/// the same [`WarehouseConfig`].
///
/// # Examples
///
/// ```rust
/// use stageward::config::WarehouseConfig;
/// use stageward::quality_log::QualityLogWriter;
///
/// let writer = QualityLogWriter::new(WarehouseConfig::new(), "data_quality_log")?;
/// # Ok::<(), stageward::error::StagewardError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QualityLogWriter {
    config: WarehouseConfig,
    table: String,
}

impl QualityLogWriter {
    /// Creates a writer targeting the given log table.
    pub fn new(config: WarehouseConfig, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        SqlSecurity::validate_identifier(&table)?;
        Ok(Self { config, table })
    }

    /// The unqualified name of the log table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Renders the insert-only statement for one result.
    ///
    /// Exposed so callers can inspect exactly what will be written.
    pub fn insert_statement(&self, result: &CheckResult) -> Result<String> {
        let table = self.config.qualify_staging(&self.table)?;
        let check_type = SqlSecurity::escape_string_literal(result.check_type.as_str())?;
        let status = SqlSecurity::escape_string_literal(result.status.as_str())?;
        let table_name = SqlSecurity::escape_string_literal(&result.table_name)?;
        let timestamp = SqlSecurity::escape_string_literal(&result.timestamp.to_rfc3339())?;
        let error_details = match &result.failed_record_summary {
            Some(summary) => SqlSecurity::escape_string_literal(summary)?,
            None => "NULL".to_string(),
        };

        Ok(format!(
            "INSERT INTO {table} \
             (\"check_type\", \"status\", \"table_name\", \"timestamp\", \
              \"record_count\", \"failed_records\", \"error_details\") \
             VALUES ({check_type}, {status}, {table_name}, {timestamp}, {}, {}, {error_details})",
            result.record_count, result.failed_record_count,
        ))
    }

    /// Appends one audit row for the given result.
    ///
    /// A write failure is surfaced as a `Persistence` error and must reach
    /// the caller: an unrecorded FAIL is a silent data-quality regression.
    #[instrument(skip(self, executor, result), fields(
        log.table = %self.table,
        check.kind = result.check_type.as_str(),
        check.status = result.status.as_str(),
    ))]
    pub async fn record(
        &self,
        executor: &dyn QueryExecutor,
        result: &CheckResult,
    ) -> Result<()> {
        let statement = self.insert_statement(result)?;
        executor
            .execute(&statement, StatementKind::Write)
            .await
            .map_err(|e| {
                StagewardError::persistence(format!(
                    "quality log write for {} on {} failed: {e}",
                    result.check_type.as_str(),
                    result.table_name
                ))
            })?;

        debug!(check.table = %result.table_name, "Check result recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CheckStatus, CheckType};
    use crate::test_helpers::ScriptedExecutor;
    use chrono::Utc;

    fn sample_result(status: CheckStatus, summary: Option<&str>) -> CheckResult {
        CheckResult {
            check_type: CheckType::DuplicateCheck,
            table_name: "dim_user".to_string(),
            status,
            timestamp: Utc::now(),
            record_count: 3,
            failed_record_count: if status.is_failure() { 2 } else { 0 },
            failed_record_summary: summary.map(str::to_string),
        }
    }

    #[test]
    fn test_insert_statement_shape() {
        let writer = QualityLogWriter::new(WarehouseConfig::new(), "data_quality_log").unwrap();
        let statement = writer
            .insert_statement(&sample_result(CheckStatus::Fail, Some("1")))
            .unwrap();

        assert!(statement.starts_with("INSERT INTO \"data_quality_log\""));
        assert!(statement.contains("'Duplicate Check'"));
        assert!(statement.contains("'FAIL'"));
        assert!(statement.contains("'dim_user'"));
        assert!(statement.contains(", 3, 2, '1')"));
    }

    #[test]
    fn test_pass_rows_write_null_details() {
        let writer = QualityLogWriter::new(WarehouseConfig::new(), "data_quality_log").unwrap();
        let statement = writer
            .insert_statement(&sample_result(CheckStatus::Pass, None))
            .unwrap();
        assert!(statement.ends_with("NULL)"));
    }

    #[test]
    fn test_summary_quotes_are_escaped() {
        let writer = QualityLogWriter::new(WarehouseConfig::new(), "data_quality_log").unwrap();
        let statement = writer
            .insert_statement(&sample_result(CheckStatus::Fail, Some("o'brien")))
            .unwrap();
        assert!(statement.contains("'o''brien'"));
    }

    #[test]
    fn test_invalid_log_table_rejected() {
        assert!(QualityLogWriter::new(WarehouseConfig::new(), "bad table").is_err());
    }

    #[tokio::test]
    async fn test_write_failure_becomes_persistence_error() {
        let executor = ScriptedExecutor::new(vec![Err(StagewardError::execution(
            "INSERT ...",
            "permission denied",
        ))]);
        let writer = QualityLogWriter::new(WarehouseConfig::new(), "data_quality_log").unwrap();

        let err = writer
            .record(&executor, &sample_result(CheckStatus::Fail, Some("1")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "persistence");
    }
}
