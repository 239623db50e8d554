//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use arrow::array::{ArrayRef, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;

use crate::error::Result;
use crate::executor::{QueryExecutor, QueryOutput, StatementKind};

/// Builds a single nullable `Int64` column.
pub fn single_int_column(values: Vec<i64>) -> ArrayRef {
    Arc::new(Int64Array::from(values))
}

/// Registers a one-column in-memory table in the session.
pub fn register_int_table(ctx: &SessionContext, table: &str, column: &str, values: ArrayRef) {
    let schema = Arc::new(Schema::new(vec![Field::new(
        column,
        DataType::Int64,
        true,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![values]).unwrap();
    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    ctx.register_table(table, Arc::new(mem_table)).unwrap();
}

/// Builds a one-column string batch.
pub fn utf8_batch(column: &str, values: Vec<&str>) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new(column, DataType::Utf8, true)]));
    RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(values))]).unwrap()
}

/// The single-batch shape DataFusion returns for DML statements.
pub fn write_count_batch(count: u64) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "count",
        DataType::UInt64,
        false,
    )]));
    RecordBatch::try_new(schema, vec![Arc::new(UInt64Array::from(vec![count]))]).unwrap()
}

/// A [`QueryExecutor`] that replays a scripted sequence of results and
/// records every statement it was asked to run.
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<Result<Vec<RecordBatch>>>>,
    statements: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<Result<Vec<RecordBatch>>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// The statements issued so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, statement: &str, kind: StatementKind) -> Result<QueryOutput> {
        self.statements.lock().unwrap().push(statement.to_string());
        let batches = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted executor ran out of results")?;

        let row_count = match kind {
            StatementKind::Read => batches.iter().map(|b| b.num_rows() as u64).sum(),
            StatementKind::Write => batches
                .first()
                .filter(|b| b.num_rows() > 0)
                .and_then(|b| b.column_by_name("count"))
                .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
                .map(|a| a.value(0))
                .unwrap_or(0),
        };

        Ok(QueryOutput { batches, row_count })
    }
}
