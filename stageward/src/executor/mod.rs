//! The query executor seam between the engine and the warehouse.
//!
//! All I/O in this crate is mediated through the [`QueryExecutor`] trait: the
//! check runner, the quality log writer, and the promoter each hand a rendered
//! statement to an executor and interpret the batches that come back. The
//! trait is the only thing a backend has to implement, which keeps rules
//! unit-testable against a scripted executor and runnable against a real
//! engine unchanged.

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

use crate::error::Result;

mod datafusion;

pub use self::datafusion::DataFusionExecutor;

/// Whether a statement reads from or writes to the warehouse.
///
/// Check queries and failure-detail queries are `Read`; quality-log inserts
/// and promotion merges are `Write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// A read-only query returning rows.
    Read,
    /// A mutating statement; `row_count` reports affected rows.
    Write,
}

/// The outcome of executing a single statement.
#[derive(Debug)]
pub struct QueryOutput {
    /// Result rows in Arrow columnar format. Empty for most writes.
    pub batches: Vec<RecordBatch>,
    /// Rows returned (for reads) or affected (for writes).
    pub row_count: u64,
}

/// An opaque engine capable of running one statement at a time.
///
/// Implementations must fail with [`StagewardError::Execution`] carrying the
/// offending statement on any backend error (syntax, permission, timeout,
/// connectivity). They must never fabricate a successful result.
///
/// [`StagewardError::Execution`]: crate::error::StagewardError::Execution
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes a single statement and returns its rows and row count.
    async fn execute(&self, statement: &str, kind: StatementKind) -> Result<QueryOutput>;
}
