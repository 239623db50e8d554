//! Executes promotion rules against a query executor.

use tracing::{info, instrument};

use super::{PromotionOutcome, PromotionRule};
use crate::config::WarehouseConfig;
use crate::error::Result;
use crate::executor::{QueryExecutor, StatementKind};

/// Runs [`PromotionRule`]s, resolving table names through a shared
/// [`WarehouseConfig`].
///
/// Promotion is insert-only and idempotent per rule: the merge statement
/// deduplicates staging rows by natural key and skips keys already present
/// in production, so repeated runs over unchanged staging data insert
/// nothing after the first.
#[derive(Debug, Clone)]
pub struct Promoter {
    config: WarehouseConfig,
}

impl Promoter {
    /// Creates a promoter resolving table names through the given configuration.
    pub fn new(config: WarehouseConfig) -> Self {
        Self { config }
    }

    /// Executes one promotion rule and reports how many rows landed.
    #[instrument(skip(self, rule, executor), fields(
        promotion.staging = rule.staging_table(),
        promotion.production = rule.production_table(),
    ))]
    pub async fn promote(
        &self,
        rule: &PromotionRule,
        executor: &dyn QueryExecutor,
    ) -> Result<PromotionOutcome> {
        let statement = rule.merge_statement(&self.config)?;
        let output = executor.execute(&statement, StatementKind::Write).await?;

        info!(
            promotion.rows_inserted = output.row_count,
            "Promotion completed"
        );

        Ok(PromotionOutcome {
            production_table: rule.production_table().to_string(),
            rows_inserted: output.row_count,
        })
    }
}
