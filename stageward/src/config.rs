//! Warehouse configuration for qualifying staging and production tables.
//!
//! Project and dataset identifiers are injected here instead of being
//! embedded in rule definitions, so the same rule set can run against any
//! environment (an embedded engine in tests, a shared warehouse in
//! production).

use crate::error::Result;
use crate::security::SqlSecurity;

/// Configuration for resolving table names in rendered statements.
///
/// Both schemas are optional: by default, tables are referenced unqualified,
/// which suits engines with a single default catalog (the common case for
/// embedded test sessions).
///
/// # Examples
///
/// ```rust
/// use stageward::config::WarehouseConfig;
///
/// let config = WarehouseConfig::new()
///     .staging_schema("staging_area")
///     .production_schema("production_area");
///
/// assert_eq!(
///     config.qualify_staging("dim_user").unwrap(),
///     "\"staging_area\".\"dim_user\""
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct WarehouseConfig {
    staging_schema: Option<String>,
    production_schema: Option<String>,
}

impl WarehouseConfig {
    /// Creates a configuration with no schema qualification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema holding staging tables and the quality log.
    pub fn staging_schema(mut self, schema: impl Into<String>) -> Self {
        self.staging_schema = Some(schema.into());
        self
    }

    /// Sets the schema holding production tables.
    pub fn production_schema(mut self, schema: impl Into<String>) -> Self {
        self.production_schema = Some(schema.into());
        self
    }

    /// Renders a validated, quoted reference to a staging table.
    pub fn qualify_staging(&self, table: &str) -> Result<String> {
        Self::qualify(self.staging_schema.as_deref(), table)
    }

    /// Renders a validated, quoted reference to a production table.
    pub fn qualify_production(&self, table: &str) -> Result<String> {
        Self::qualify(self.production_schema.as_deref(), table)
    }

    fn qualify(schema: Option<&str>, table: &str) -> Result<String> {
        let table = SqlSecurity::escape_identifier(table)?;
        match schema {
            Some(schema) => {
                let schema = SqlSecurity::escape_identifier(schema)?;
                Ok(format!("{schema}.{table}"))
            }
            None => Ok(table),
        }
    }
}
