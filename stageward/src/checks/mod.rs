//! Declarative quality rules and their execution.
//!
//! A [`QualityRule`] is pure data describing one validation predicate over
//! one staging table. The rule renders itself as two read-only statements:
//! an aggregate *check* query producing the scanned and violating row
//! counts, and an ordered *detail* query projecting the offending values for
//! the audit summary. The [`CheckRunner`] interprets rules against any
//! [`QueryExecutor`], so the same rule definitions run against an embedded
//! test session or a shared warehouse.
//!
//! [`QueryExecutor`]: crate::executor::QueryExecutor

use serde::{Deserialize, Serialize};

use crate::config::WarehouseConfig;
use crate::error::{Result, StagewardError};
use crate::security::SqlSecurity;

mod result;
mod runner;

pub use result::{CheckResult, CheckStatus};
pub use runner::CheckRunner;

/// The kind of validation a rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckType {
    /// Fails for rows where the target column is NULL.
    NullCheck,
    /// Fails for rows whose key value occurs more than once.
    DuplicateCheck,
    /// Fails for rows whose value falls outside inclusive bounds.
    RangeCheck,
}

impl CheckType {
    /// Returns the label written to the quality log.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::NullCheck => "Null Check",
            CheckType::DuplicateCheck => "Duplicate Check",
            CheckType::RangeCheck => "Range Check",
        }
    }
}

/// Inclusive numeric bounds for a range check.
///
/// Values exactly at `min` or `max` pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    /// Lowest accepted value
    pub min: f64,
    /// Highest accepted value
    pub max: f64,
}

impl RangeBounds {
    /// Creates bounds, rejecting non-finite values and `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(StagewardError::configuration(
                "range bounds must be finite (not NaN or infinite)",
            ));
        }
        if min > max {
            return Err(StagewardError::configuration(format!(
                "range lower bound {min} exceeds upper bound {max}"
            )));
        }
        Ok(Self { min, max })
    }
}

/// Marker recorded when a null check fails on a column that is itself the
/// key, so there is no separate value to report.
pub const NULL_VALUE_MARKER: &str = "<null>";

/// A single declarative validation predicate over one staging table.
///
/// Rules are read-only: evaluating one never mutates the table under test.
/// Construction validates every identifier and required parameter, so a
/// malformed rule surfaces as a `Configuration` error before anything runs.
///
/// # Examples
///
/// ```rust
/// use stageward::checks::QualityRule;
///
/// let null_check = QualityRule::null_check("dim_user", "user_id")?;
/// let dup_check = QualityRule::duplicate_check("dim_product", "product_id")?;
/// let range_check = QualityRule::range_check("fact_review", "rating", 0.0, 5.0)?;
/// # Ok::<(), stageward::error::StagewardError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QualityRule {
    check_type: CheckType,
    table: String,
    target_column: String,
    bounds: Option<RangeBounds>,
    report_column: Option<String>,
}

impl QualityRule {
    /// Creates a rule failing for rows where `column` is NULL.
    pub fn null_check(table: impl Into<String>, column: impl Into<String>) -> Result<Self> {
        let rule = Self {
            check_type: CheckType::NullCheck,
            table: table.into(),
            target_column: column.into(),
            bounds: None,
            report_column: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Creates a rule failing for rows whose `key_column` value is duplicated.
    pub fn duplicate_check(table: impl Into<String>, key_column: impl Into<String>) -> Result<Self> {
        let rule = Self {
            check_type: CheckType::DuplicateCheck,
            table: table.into(),
            target_column: key_column.into(),
            bounds: None,
            report_column: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Creates a rule failing for rows where `column` falls outside the
    /// inclusive `[min, max]` interval.
    pub fn range_check(
        table: impl Into<String>,
        column: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Result<Self> {
        let rule = Self {
            check_type: CheckType::RangeCheck,
            table: table.into(),
            target_column: column.into(),
            bounds: Some(RangeBounds::new(min, max)?),
            report_column: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// For a null check, reports the values of `column` for violating rows
    /// instead of the fixed [`NULL_VALUE_MARKER`]. Useful when the nullable
    /// column is not the table's key.
    pub fn with_report_column(mut self, column: impl Into<String>) -> Result<Self> {
        let column = column.into();
        if self.check_type != CheckType::NullCheck {
            return Err(StagewardError::configuration(
                "report columns only apply to null checks",
            ));
        }
        SqlSecurity::validate_identifier(&column)?;
        self.report_column = Some(column);
        Ok(self)
    }

    /// The kind of validation this rule performs.
    pub fn check_type(&self) -> CheckType {
        self.check_type
    }

    /// The staging table under validation.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The column the rule applies to.
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Validates identifiers and rule-specific parameters.
    ///
    /// Constructors already call this; the pipeline builder calls it again
    /// so a hand-assembled stage list cannot smuggle in a malformed rule.
    pub fn validate(&self) -> Result<()> {
        SqlSecurity::validate_identifier(&self.table)?;
        SqlSecurity::validate_identifier(&self.target_column)?;
        if let Some(column) = &self.report_column {
            SqlSecurity::validate_identifier(column)?;
        }
        if self.check_type == CheckType::RangeCheck && self.bounds.is_none() {
            return Err(StagewardError::configuration(format!(
                "range check on {}.{} is missing bounds",
                self.table, self.target_column
            )));
        }
        Ok(())
    }

    /// Renders the aggregate check query.
    ///
    /// Always yields exactly one row with two Int64 columns, `record_count`
    /// (unfiltered total) and `failed_count` (violating rows).
    pub fn check_sql(&self, config: &WarehouseConfig) -> Result<String> {
        let table = config.qualify_staging(&self.table)?;
        let column = SqlSecurity::escape_identifier(&self.target_column)?;

        let sql = match self.check_type {
            CheckType::NullCheck => format!(
                "SELECT COUNT(*) AS record_count, \
                 COUNT(CASE WHEN {column} IS NULL THEN 1 END) AS failed_count \
                 FROM {table}"
            ),
            CheckType::DuplicateCheck => format!(
                "SELECT COALESCE(SUM(occurrences), 0) AS record_count, \
                 COALESCE(SUM(CASE WHEN occurrences > 1 THEN occurrences ELSE 0 END), 0) AS failed_count \
                 FROM (SELECT COUNT(*) AS occurrences FROM {table} GROUP BY {column}) AS group_counts"
            ),
            CheckType::RangeCheck => {
                let bounds = self.bounds.ok_or_else(|| {
                    StagewardError::configuration("range check is missing bounds")
                })?;
                let (min, max) = (bounds.min, bounds.max);
                format!(
                    "SELECT COUNT(*) AS record_count, \
                     COUNT(CASE WHEN {column} < {min} OR {column} > {max} THEN 1 END) AS failed_count \
                     FROM {table}"
                )
            }
        };

        Ok(sql)
    }

    /// Renders the failure-detail query, if the rule has one.
    ///
    /// The query projects a single `failed_value` VARCHAR column, ordered so
    /// the joined summary is deterministic. A null check without a report
    /// column has no detail query; its summary is [`NULL_VALUE_MARKER`].
    pub fn detail_sql(&self, config: &WarehouseConfig) -> Result<Option<String>> {
        let table = config.qualify_staging(&self.table)?;
        let column = SqlSecurity::escape_identifier(&self.target_column)?;

        let sql = match self.check_type {
            CheckType::NullCheck => match &self.report_column {
                Some(report) => {
                    let report = SqlSecurity::escape_identifier(report)?;
                    Some(format!(
                        "SELECT CAST({report} AS VARCHAR) AS failed_value \
                         FROM {table} WHERE {column} IS NULL ORDER BY failed_value"
                    ))
                }
                None => None,
            },
            // Distinct duplicated keys, not one row per duplicate: the
            // summary names each offending key once while failed_count
            // still counts every row in the violating groups.
            CheckType::DuplicateCheck => Some(format!(
                "SELECT CAST({column} AS VARCHAR) AS failed_value \
                 FROM {table} GROUP BY {column} HAVING COUNT(*) > 1 ORDER BY failed_value"
            )),
            CheckType::RangeCheck => {
                let bounds = self.bounds.ok_or_else(|| {
                    StagewardError::configuration("range check is missing bounds")
                })?;
                let (min, max) = (bounds.min, bounds.max);
                Some(format!(
                    "SELECT CAST({column} AS VARCHAR) AS failed_value \
                     FROM {table} WHERE {column} < {min} OR {column} > {max} ORDER BY failed_value"
                ))
            }
        };

        Ok(sql)
    }
}
