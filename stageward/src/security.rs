//! SQL identifier and literal hygiene for rendered statements.
//!
//! Every table and column name that reaches a rendered statement passes
//! through this module first. Rules are configuration values, so an invalid
//! identifier is reported as a `Configuration` error before execution.

use crate::error::{Result, StagewardError};
use once_cell::sync::Lazy;
use regex::Regex;

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and escapes a SQL identifier (table name, column name, etc.).
    ///
    /// # Arguments
    /// * `identifier` - The identifier to validate and escape
    ///
    /// # Returns
    /// * `Ok(String)` - The safely escaped identifier ready for SQL use
    /// * `Err(StagewardError)` - If the identifier is invalid or potentially malicious
    ///
    /// # Examples
    /// ```rust
    /// use stageward::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("user_id").unwrap(), "\"user_id\"");
    /// assert!(SqlSecurity::escape_identifier("id; DROP TABLE users--").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        Ok(format!("\"{identifier}\""))
    }

    /// Validates a SQL identifier without escaping it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.is_empty() || identifier.trim().is_empty() {
            return Err(StagewardError::configuration(
                "SQL identifier cannot be empty or whitespace-only",
            ));
        }

        // Length cap prevents pathological inputs
        if identifier.len() > 128 {
            return Err(StagewardError::configuration(
                "SQL identifier too long (max 128 characters)",
            ));
        }

        if identifier.contains('\0') {
            return Err(StagewardError::configuration(
                "SQL identifier cannot contain null bytes",
            ));
        }

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            // Letters, numbers, underscores; must start with letter or underscore.
            // This regex is compile-time constant and known to be valid.
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(StagewardError::configuration(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, and underscores"
            )));
        }

        Self::check_dangerous_patterns(identifier)?;

        Ok(())
    }

    /// Escapes a string value for embedding as a single-quoted SQL literal.
    ///
    /// Used for the values written into the quality log. Rejects null bytes;
    /// doubles embedded single quotes.
    pub fn escape_string_literal(value: &str) -> Result<String> {
        if value.contains('\0') {
            return Err(StagewardError::configuration(
                "SQL string literal cannot contain null bytes",
            ));
        }
        let escaped = value.replace('\'', "''");
        Ok(format!("'{escaped}'"))
    }

    /// Checks for dangerous patterns in identifiers.
    fn check_dangerous_patterns(identifier: &str) -> Result<()> {
        let identifier_lower = identifier.to_lowercase();

        let dangerous_patterns = &[
            ";", "--", "/*", "*/", "'", "xp_", "sp_", "union", "select", "insert", "update",
            "delete", "drop", "create", "alter", "exec", "execute",
        ];

        for pattern in dangerous_patterns {
            if identifier_lower.contains(pattern) {
                return Err(StagewardError::configuration(format!(
                    "SQL identifier contains dangerous pattern: '{pattern}'"
                )));
            }
        }

        Ok(())
    }
}
