//! Executes quality rules and assembles audited results.

use arrow::array::{Array, Int64Array, UInt64Array};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::{CheckResult, CheckStatus, QualityRule, NULL_VALUE_MARKER};
use crate::config::WarehouseConfig;
use crate::error::{Result, StagewardError};
use crate::executor::{QueryExecutor, StatementKind};

/// Interprets [`QualityRule`]s against a query executor.
///
/// The runner is read-only: it issues the rule's check query, and only when
/// violations exist, the failure-detail query. It always produces a complete
/// [`CheckResult`] or propagates the executor's error. It never fabricates a
/// PASS when the backend fails.
#[derive(Debug, Clone)]
pub struct CheckRunner {
    config: WarehouseConfig,
}

impl CheckRunner {
    /// Creates a runner resolving table names through the given configuration.
    pub fn new(config: WarehouseConfig) -> Self {
        Self { config }
    }

    /// Evaluates one rule, returning its timestamped result.
    #[instrument(skip(self, rule, executor), fields(
        check.kind = rule.check_type().as_str(),
        check.table = rule.table(),
        check.column = rule.target_column(),
    ))]
    pub async fn run_check(
        &self,
        rule: &QualityRule,
        executor: &dyn QueryExecutor,
    ) -> Result<CheckResult> {
        let check_sql = rule.check_sql(&self.config)?;
        let output = executor.execute(&check_sql, StatementKind::Read).await?;
        let (record_count, failed_record_count) = extract_counts(&output.batches, &check_sql)?;

        let failed_record_summary = if failed_record_count > 0 {
            match rule.detail_sql(&self.config)? {
                Some(detail_sql) => {
                    let detail = executor.execute(&detail_sql, StatementKind::Read).await?;
                    Some(join_failed_values(&detail.batches)?)
                }
                None => Some(NULL_VALUE_MARKER.to_string()),
            }
        } else {
            None
        };

        let status = if failed_record_count > 0 {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        };

        match status {
            CheckStatus::Pass => debug!(
                check.record_count = record_count,
                "Check passed"
            ),
            CheckStatus::Fail => warn!(
                check.record_count = record_count,
                check.failed_count = failed_record_count,
                check.summary = failed_record_summary.as_deref().unwrap_or_default(),
                "Check failed"
            ),
        }

        Ok(CheckResult {
            check_type: rule.check_type(),
            table_name: rule.table().to_string(),
            status,
            timestamp: Utc::now(),
            record_count,
            failed_record_count,
            failed_record_summary,
        })
    }
}

/// Reads the `record_count` / `failed_count` pair from a check query result.
fn extract_counts(batches: &[RecordBatch], statement: &str) -> Result<(u64, u64)> {
    let batch = batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .ok_or_else(|| {
            StagewardError::Internal(format!(
                "check query returned no rows: {statement}"
            ))
        })?;

    let record_count = count_at(batch, 0)?;
    let failed_count = count_at(batch, 1)?;
    Ok((record_count, failed_count))
}

fn count_at(batch: &RecordBatch, index: usize) -> Result<u64> {
    let column = batch.columns().get(index).ok_or_else(|| {
        StagewardError::Internal(format!("check query result is missing column {index}"))
    })?;

    if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
        if array.is_null(0) {
            return Ok(0);
        }
        return Ok(array.value(0).max(0) as u64);
    }
    if let Some(array) = column.as_any().downcast_ref::<UInt64Array>() {
        if array.is_null(0) {
            return Ok(0);
        }
        return Ok(array.value(0));
    }

    Err(StagewardError::Internal(format!(
        "check query count column {index} has unexpected type {:?}",
        column.data_type()
    )))
}

/// Joins the ordered `failed_value` rows with `", "`.
fn join_failed_values(batches: &[RecordBatch]) -> Result<String> {
    let mut values = Vec::new();
    for batch in batches {
        if batch.num_columns() == 0 {
            continue;
        }
        let column = batch.column(0);
        for row in 0..batch.num_rows() {
            if column.is_null(row) {
                continue;
            }
            let value = array_value_to_string(column, row).map_err(|e| {
                StagewardError::Internal(format!("failed to render detail value: {e}"))
            })?;
            values.push(value);
        }
    }
    Ok(values.join(", "))
}
