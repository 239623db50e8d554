//! DataFusion-backed query executor.
//!
//! Wraps a DataFusion `SessionContext` so that staging and production tables
//! registered in the session (e.g. `MemTable`s, Parquet listings) can serve
//! as the warehouse. DML statements such as `INSERT INTO ... SELECT` report
//! their affected-row count through the single `count` column DataFusion
//! returns for writes.

use arrow::array::{Array, Int64Array, UInt64Array};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use tracing::{debug, instrument};

use super::{QueryExecutor, QueryOutput, StatementKind};
use crate::error::{Result, StagewardError};

/// A [`QueryExecutor`] that runs statements against a DataFusion session.
///
/// # Examples
///
/// ```rust,no_run
/// use datafusion::prelude::SessionContext;
/// use stageward::executor::DataFusionExecutor;
///
/// let ctx = SessionContext::new();
/// // ... register staging, production, and quality-log tables ...
/// let executor = DataFusionExecutor::new(ctx);
/// ```
pub struct DataFusionExecutor {
    ctx: SessionContext,
}

impl DataFusionExecutor {
    /// Creates an executor over the given session context.
    ///
    /// The caller is responsible for registering every table the rules
    /// reference before the pipeline runs.
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// Returns the underlying session context.
    pub fn session(&self) -> &SessionContext {
        &self.ctx
    }

    /// Extracts the affected-row count from a DML result.
    ///
    /// DataFusion reports writes as a single batch with one `count` column.
    fn write_row_count(batches: &[RecordBatch]) -> Option<u64> {
        let batch = batches.first()?;
        if batch.num_rows() == 0 {
            return None;
        }
        let column = batch.column_by_name("count").or_else(|| {
            if batch.num_columns() == 1 {
                Some(batch.column(0))
            } else {
                None
            }
        })?;
        if let Some(array) = column.as_any().downcast_ref::<UInt64Array>() {
            return Some(array.value(0));
        }
        if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
            return Some(array.value(0) as u64);
        }
        None
    }
}

#[async_trait]
impl QueryExecutor for DataFusionExecutor {
    #[instrument(skip(self, statement), fields(statement.kind = ?kind))]
    async fn execute(&self, statement: &str, kind: StatementKind) -> Result<QueryOutput> {
        let df = self
            .ctx
            .sql(statement)
            .await
            .map_err(|e| StagewardError::execution(statement, e.to_string()))?;

        let batches = df
            .collect()
            .await
            .map_err(|e| StagewardError::execution(statement, e.to_string()))?;

        let row_count = match kind {
            StatementKind::Read => batches.iter().map(|b| b.num_rows() as u64).sum(),
            StatementKind::Write => Self::write_row_count(&batches).unwrap_or(0),
        };

        debug!(
            statement.kind = ?kind,
            result.row_count = row_count,
            result.batches = batches.len(),
            "Statement executed"
        );

        Ok(QueryOutput { batches, row_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{register_int_table, single_int_column};

    #[tokio::test]
    async fn test_read_reports_returned_rows() {
        let ctx = SessionContext::new();
        register_int_table(&ctx, "numbers", "n", single_int_column(vec![1, 2, 3]));
        let executor = DataFusionExecutor::new(ctx);

        let output = executor
            .execute("SELECT n FROM numbers", StatementKind::Read)
            .await
            .unwrap();
        assert_eq!(output.row_count, 3);
    }

    #[tokio::test]
    async fn test_write_reports_inserted_rows() {
        let ctx = SessionContext::new();
        register_int_table(&ctx, "source", "n", single_int_column(vec![1, 2, 3]));
        register_int_table(&ctx, "target", "n", single_int_column(vec![]));
        let executor = DataFusionExecutor::new(ctx);

        let output = executor
            .execute(
                "INSERT INTO target SELECT n FROM source",
                StatementKind::Write,
            )
            .await
            .unwrap();
        assert_eq!(output.row_count, 3);
    }

    #[tokio::test]
    async fn test_backend_error_carries_statement() {
        let ctx = SessionContext::new();
        let executor = DataFusionExecutor::new(ctx);

        let err = executor
            .execute("SELECT * FROM missing_table", StatementKind::Read)
            .await
            .unwrap_err();
        match err {
            StagewardError::Execution { statement, .. } => {
                assert!(statement.contains("missing_table"));
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }
}
