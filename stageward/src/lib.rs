//! # Stageward - Quality Checks and Promotion for Staged Data
//!
//! Stageward validates staged tables with declarative data-quality rules,
//! records every outcome in an append-only quality log, and promotes clean
//! rows from staging into production tables — deduplicated and idempotent.
//! It executes SQL through an opaque [`QueryExecutor`] seam, with a bundled
//! DataFusion implementation for embedded use and testing.
//!
//! ## Overview
//!
//! A typical warehouse refresh lands raw rows in staging tables, checks them
//! for nulls, duplicates, and out-of-range values, and then merges the new
//! rows into production. Stageward models that flow as three parts:
//!
//! - **Checks**: [`QualityRule`]s (null, duplicate, range) evaluated by a
//!   [`CheckRunner`] into timestamped pass/fail [`CheckResult`]s.
//! - **Audit**: a [`QualityLogWriter`] appending every result to a durable
//!   log table, one insert per evaluation, never updated.
//! - **Promotion**: [`PromotionRule`]s merging staging rows into production
//!   by natural key — duplicates collapse to one row, keys already in
//!   production are skipped, so re-running a promotion is a no-op.
//!
//! A [`PromotionPipeline`] sequences all three: checks run first and their
//! results are logged; a failing check is recorded and the run continues,
//! while backend errors halt the remainder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datafusion::prelude::SessionContext;
//! use stageward::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PromotionPipeline::builder("daily_refresh")
//!     .check(QualityRule::duplicate_check("stg_dim_user", "user_id")?)
//!     .check(QualityRule::null_check("stg_fact_review", "review_id")?)
//!     .check(QualityRule::range_check("stg_fact_review", "rating", 1.0, 5.0)?)
//!     .promotion(PromotionRule::new(
//!         "stg_dim_user",
//!         "dim_user",
//!         ["user_id"],
//!         ["user_id", "user_name"],
//!     )?)
//!     .promotion(
//!         PromotionRule::new(
//!             "stg_fact_review",
//!             "fact_review",
//!             ["review_id"],
//!             ["review_id", "user_id", "rating"],
//!         )?
//!         .references(["dim_user"])?,
//!     )
//!     .build()?;
//!
//! let ctx = SessionContext::new();
//! // ... register staging, production, and quality-log tables ...
//! let executor = DataFusionExecutor::new(ctx);
//!
//! let report = pipeline.run(&executor).await;
//! for failed in report.failed_checks() {
//!     println!("{} on {} failed", failed.check_type.as_str(), failed.table_name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`checks`**: rule types, SQL rendering, and the check runner
//! - **`quality_log`**: append-only persistence of check results
//! - **`promotion`**: deduplicating, idempotent staging-to-production merges
//! - **`pipeline`**: sequential orchestration with per-stage error handling
//! - **`executor`**: the [`QueryExecutor`] trait and its DataFusion backend
//! - **`config`**: schema qualification for staging and production tables
//! - **`security`**: SQL identifier validation and escaping
//! - **`logging`**: optional `tracing` subscriber setup for hosts
//!
//! [`QueryExecutor`]: executor::QueryExecutor
//! [`QualityRule`]: checks::QualityRule
//! [`CheckRunner`]: checks::CheckRunner
//! [`CheckResult`]: checks::CheckResult
//! [`QualityLogWriter`]: quality_log::QualityLogWriter
//! [`PromotionRule`]: promotion::PromotionRule
//! [`PromotionPipeline`]: pipeline::PromotionPipeline

pub mod checks;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod promotion;
pub mod quality_log;
pub mod security;

#[cfg(test)]
pub mod test_helpers;
