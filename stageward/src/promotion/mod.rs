//! Declarative promotion of staging rows into production tables.
//!
//! A [`PromotionRule`] describes one insert-only merge: staging rows are
//! projected onto the promoted columns, deduplicated by natural key, and
//! anti-joined against production so only keys absent from production are
//! inserted. Running the same rule twice against unchanged staging data
//! inserts zero rows the second time.

use serde::{Deserialize, Serialize};

use crate::config::WarehouseConfig;
use crate::error::{Result, StagewardError};
use crate::security::SqlSecurity;

mod promoter;

pub use promoter::Promoter;

/// Internal alias for the dedup rank column; kept out of the way of real
/// column names by the underscore prefix.
const RANK_COLUMN: &str = "__dedup_rank";

/// The outcome of executing one promotion rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionOutcome {
    /// The production table that received rows
    pub production_table: String,
    /// Rows inserted by this run; zero when production already held every key
    pub rows_inserted: u64,
}

/// Describes how new rows move from a staging table into a production table.
///
/// The natural key identifies a logical entity across both tables; promoted
/// rows carry the projected columns, which must include the key. When two
/// staging rows share a key but differ elsewhere, the row that sorts first on
/// the remaining projected columns wins — a whole staging row is promoted,
/// never a mix of columns from different rows.
///
/// # Examples
///
/// ```rust
/// use stageward::promotion::PromotionRule;
///
/// let users = PromotionRule::new(
///     "stg_dim_user",
///     "dim_user",
///     ["user_id"],
///     ["user_id", "user_name"],
/// )?;
///
/// let reviews = PromotionRule::new(
///     "stg_fact_review",
///     "fact_review",
///     ["review_id"],
///     ["review_id", "user_id", "product_id", "rating"],
/// )?
/// .references(["dim_user", "dim_product"])?;
/// # Ok::<(), stageward::error::StagewardError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionRule {
    staging_table: String,
    production_table: String,
    natural_key: Vec<String>,
    projected_columns: Vec<String>,
    references: Vec<String>,
}

impl PromotionRule {
    /// Creates a promotion rule.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when the key is empty, a key column
    /// is not among the projected columns, or any identifier is invalid.
    pub fn new<K, P>(
        staging_table: impl Into<String>,
        production_table: impl Into<String>,
        natural_key: K,
        projected_columns: P,
    ) -> Result<Self>
    where
        K: IntoIterator,
        K::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let rule = Self {
            staging_table: staging_table.into(),
            production_table: production_table.into(),
            natural_key: natural_key.into_iter().map(Into::into).collect(),
            projected_columns: projected_columns.into_iter().map(Into::into).collect(),
            references: Vec::new(),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Declares the production tables this entity's rows reference.
    ///
    /// The pipeline builder uses these to assert referenced-before-referencing
    /// promotion order at construction time.
    pub fn references<I>(mut self, tables: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.references = tables.into_iter().map(Into::into).collect();
        for table in &self.references {
            SqlSecurity::validate_identifier(table)?;
        }
        Ok(self)
    }

    /// The staging table rows are promoted from.
    pub fn staging_table(&self) -> &str {
        &self.staging_table
    }

    /// The production table rows are promoted into.
    pub fn production_table(&self) -> &str {
        &self.production_table
    }

    /// The natural key columns.
    pub fn natural_key(&self) -> &[String] {
        &self.natural_key
    }

    /// The columns copied from staging to production.
    pub fn projected_columns(&self) -> &[String] {
        &self.projected_columns
    }

    /// The production tables this entity references.
    pub fn referenced_tables(&self) -> &[String] {
        &self.references
    }

    /// Validates identifiers and structural requirements.
    pub fn validate(&self) -> Result<()> {
        SqlSecurity::validate_identifier(&self.staging_table)?;
        SqlSecurity::validate_identifier(&self.production_table)?;

        if self.natural_key.is_empty() {
            return Err(StagewardError::configuration(format!(
                "promotion into {} has an empty natural key",
                self.production_table
            )));
        }
        if self.projected_columns.is_empty() {
            return Err(StagewardError::configuration(format!(
                "promotion into {} projects no columns",
                self.production_table
            )));
        }

        for column in self.natural_key.iter().chain(&self.projected_columns) {
            SqlSecurity::validate_identifier(column)?;
        }
        for key in &self.natural_key {
            if !self.projected_columns.contains(key) {
                return Err(StagewardError::configuration(format!(
                    "natural key column {key} is not among the projected columns of {}",
                    self.production_table
                )));
            }
        }

        Ok(())
    }

    /// Renders the dedup + anti-join + insert merge statement.
    ///
    /// Staging rows are ranked per key by the non-key projected columns;
    /// rank 1 survives. The left-exclusive join keeps only keys absent from
    /// production, so re-running the statement is a no-op.
    pub fn merge_statement(&self, config: &WarehouseConfig) -> Result<String> {
        self.validate()?;

        let staging = config.qualify_staging(&self.staging_table)?;
        let production = config.qualify_production(&self.production_table)?;

        let projected: Vec<String> = self
            .projected_columns
            .iter()
            .map(|c| SqlSecurity::escape_identifier(c))
            .collect::<Result<_>>()?;
        let keys: Vec<String> = self
            .natural_key
            .iter()
            .map(|k| SqlSecurity::escape_identifier(k))
            .collect::<Result<_>>()?;

        // Tie-break for same-key rows: order by the remaining projected
        // columns; with a key-only projection the rows are identical anyway.
        let non_key: Vec<String> = self
            .projected_columns
            .iter()
            .filter(|c| !self.natural_key.contains(c))
            .map(|c| SqlSecurity::escape_identifier(c))
            .collect::<Result<_>>()?;
        let order_by = if non_key.is_empty() {
            keys.join(", ")
        } else {
            non_key.join(", ")
        };

        let insert_columns = projected.join(", ");
        let staged_columns = projected
            .iter()
            .map(|c| format!("staged.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let partition_by = keys.join(", ");
        let join_condition = keys
            .iter()
            .map(|k| format!("staged.{k} = existing.{k}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let absent_condition = format!("existing.{} IS NULL", keys[0]);

        Ok(format!(
            "INSERT INTO {production} ({insert_columns}) \
             SELECT {staged_columns} \
             FROM (SELECT {insert_columns}, \
                   ROW_NUMBER() OVER (PARTITION BY {partition_by} ORDER BY {order_by}) AS \"{RANK_COLUMN}\" \
                   FROM {staging}) AS staged \
             LEFT JOIN {production} AS existing ON {join_condition} \
             WHERE staged.\"{RANK_COLUMN}\" = 1 AND {absent_condition}"
        ))
    }
}
