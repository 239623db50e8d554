//! Sequential orchestration of checks, audit writes, and promotions.
//!
//! A [`PromotionPipeline`] runs its quality checks in order, records every
//! result in the quality log, then runs its promotions in order. A failing
//! check is data, not an error: the failure is logged and the pipeline keeps
//! going. Backend errors (`Execution`, `Persistence`) halt the remainder of
//! the run; effects already applied stay intact, there is no rollback.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::checks::{CheckResult, CheckRunner, QualityRule};
use crate::config::WarehouseConfig;
use crate::error::{Result, StagewardError};
use crate::executor::QueryExecutor;
use crate::promotion::{Promoter, PromotionOutcome, PromotionRule};
use crate::quality_log::QualityLogWriter;

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Every stage ran. Check failures may still have been recorded.
    Completed,
    /// A backend error halted the run at the named stage.
    Failed {
        /// Human-readable identifier of the stage that errored
        stage: String,
        /// The underlying error, rendered
        error: String,
    },
}

impl PipelineStatus {
    /// Returns true if every stage ran to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineStatus::Completed)
    }
}

/// The full account of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Pipeline name, as given to the builder
    pub pipeline: String,
    /// Terminal state of the run
    pub status: PipelineStatus,
    /// Results of every check that executed, in order
    pub check_results: Vec<CheckResult>,
    /// Outcomes of every promotion that executed, in order
    pub promotions: Vec<PromotionOutcome>,
    /// When the run began (UTC)
    pub started_at: DateTime<Utc>,
    /// When the run ended (UTC)
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    /// The checks that found violations during this run.
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.check_results.iter().filter(|r| !r.passed()).collect()
    }
}

/// An ordered set of quality checks and promotions over one warehouse.
///
/// # Examples
///
/// ```rust,no_run
/// use stageward::checks::QualityRule;
/// use stageward::pipeline::PromotionPipeline;
/// use stageward::promotion::PromotionRule;
///
/// let pipeline = PromotionPipeline::builder("daily_refresh")
///     .check(QualityRule::duplicate_check("stg_dim_user", "user_id")?)
///     .check(QualityRule::null_check("stg_fact_review", "review_id")?)
///     .promotion(PromotionRule::new(
///         "stg_dim_user",
///         "dim_user",
///         ["user_id"],
///         ["user_id", "user_name"],
///     )?)
///     .build()?;
/// # Ok::<(), stageward::error::StagewardError>(())
/// ```
#[derive(Debug)]
pub struct PromotionPipeline {
    name: String,
    runner: CheckRunner,
    writer: QualityLogWriter,
    promoter: Promoter,
    checks: Vec<QualityRule>,
    promotions: Vec<PromotionRule>,
}

impl PromotionPipeline {
    /// Starts building a pipeline with the given name.
    pub fn builder(name: impl Into<String>) -> PromotionPipelineBuilder {
        PromotionPipelineBuilder::new(name)
    }

    /// The pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs every stage sequentially and returns the full report.
    ///
    /// Never returns an error: backend failures are captured in the report's
    /// status together with the stage they occurred in.
    #[instrument(skip(self, executor), fields(
        pipeline.name = %self.name,
        pipeline.checks = self.checks.len(),
        pipeline.promotions = self.promotions.len(),
    ))]
    pub async fn run(&self, executor: &dyn QueryExecutor) -> PipelineReport {
        let started_at = Utc::now();
        info!("Pipeline started");

        let mut check_results = Vec::new();
        let mut promotions = Vec::new();
        let mut status = PipelineStatus::Completed;

        'stages: {
            for rule in &self.checks {
                let stage = format!(
                    "check {} on {}",
                    rule.check_type().as_str(),
                    rule.table()
                );
                let result = match self.runner.run_check(rule, executor).await {
                    Ok(result) => result,
                    Err(e) => {
                        status = halt(&stage, &e);
                        break 'stages;
                    }
                };

                let log_stage = format!("quality log write for {stage}");
                if let Err(e) = self.writer.record(executor, &result).await {
                    status = halt(&log_stage, &e);
                    break 'stages;
                }

                if !result.passed() {
                    warn!(
                        check.kind = result.check_type.as_str(),
                        check.table = %result.table_name,
                        check.failed_count = result.failed_record_count,
                        "Check failed, continuing"
                    );
                }
                check_results.push(result);
            }

            for rule in &self.promotions {
                let stage = format!("promotion into {}", rule.production_table());
                match self.promoter.promote(rule, executor).await {
                    Ok(outcome) => promotions.push(outcome),
                    Err(e) => {
                        status = halt(&stage, &e);
                        break 'stages;
                    }
                }
            }
        }

        let finished_at = Utc::now();
        if status.is_completed() {
            info!(
                pipeline.check_results = check_results.len(),
                pipeline.promotions_run = promotions.len(),
                "Pipeline completed"
            );
        }

        PipelineReport {
            pipeline: self.name.clone(),
            status,
            check_results,
            promotions,
            started_at,
            finished_at,
        }
    }
}

fn halt(stage: &str, e: &StagewardError) -> PipelineStatus {
    error!(pipeline.stage = stage, error = %e, "Pipeline halted");
    PipelineStatus::Failed {
        stage: stage.to_string(),
        error: e.to_string(),
    }
}

/// Builder for [`PromotionPipeline`].
#[derive(Debug)]
pub struct PromotionPipelineBuilder {
    name: String,
    config: WarehouseConfig,
    quality_log_table: String,
    checks: Vec<QualityRule>,
    promotions: Vec<PromotionRule>,
}

impl PromotionPipelineBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: WarehouseConfig::new(),
            quality_log_table: "data_quality_log".to_string(),
            checks: Vec::new(),
            promotions: Vec::new(),
        }
    }

    /// Sets the warehouse configuration shared by every stage.
    pub fn config(mut self, config: WarehouseConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the quality-log table (default `data_quality_log`).
    pub fn quality_log_table(mut self, table: impl Into<String>) -> Self {
        self.quality_log_table = table.into();
        self
    }

    /// Appends one quality check. Checks run in insertion order.
    pub fn check(mut self, rule: QualityRule) -> Self {
        self.checks.push(rule);
        self
    }

    /// Appends several quality checks.
    pub fn checks<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = QualityRule>,
    {
        self.checks.extend(rules);
        self
    }

    /// Appends one promotion. Promotions run in insertion order, after
    /// every check.
    pub fn promotion(mut self, rule: PromotionRule) -> Self {
        self.promotions.push(rule);
        self
    }

    /// Appends several promotions.
    pub fn promotions<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = PromotionRule>,
    {
        self.promotions.extend(rules);
        self
    }

    /// Validates every rule and the promotion order, then builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when the name is empty, any rule is
    /// invalid, or a promotion references a production table that is promoted
    /// later in the list. References to tables outside this pipeline are
    /// allowed; they are assumed to already exist.
    pub fn build(self) -> Result<PromotionPipeline> {
        if self.name.trim().is_empty() {
            return Err(StagewardError::configuration(
                "pipeline name must not be empty",
            ));
        }
        for rule in &self.checks {
            rule.validate()?;
        }
        for rule in &self.promotions {
            rule.validate()?;
        }
        self.validate_promotion_order()?;

        let writer = QualityLogWriter::new(self.config.clone(), self.quality_log_table)?;
        Ok(PromotionPipeline {
            name: self.name,
            runner: CheckRunner::new(self.config.clone()),
            writer,
            promoter: Promoter::new(self.config),
            checks: self.checks,
            promotions: self.promotions,
        })
    }

    /// Referenced production tables must be promoted before their referrers.
    fn validate_promotion_order(&self) -> Result<()> {
        for (position, rule) in self.promotions.iter().enumerate() {
            for referenced in rule.referenced_tables() {
                let promoted_later = self.promotions[position..]
                    .iter()
                    .any(|later| later.production_table() == referenced);
                if promoted_later {
                    return Err(StagewardError::configuration(format!(
                        "promotion into {} references {referenced}, which is promoted later in the pipeline",
                        rule.production_table()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckStatus;
    use crate::test_helpers::{write_count_batch, ScriptedExecutor};
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn counts_batch(record_count: i64, failed_count: i64) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("record_count", DataType::Int64, true),
            Field::new("failed_count", DataType::Int64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![record_count])),
                Arc::new(Int64Array::from(vec![failed_count])),
            ],
        )
        .unwrap()
    }

    fn users_promotion() -> PromotionRule {
        PromotionRule::new(
            "stg_dim_user",
            "dim_user",
            ["user_id"],
            ["user_id", "user_name"],
        )
        .unwrap()
    }

    #[test]
    fn test_build_rejects_forward_reference() {
        let reviews = PromotionRule::new(
            "stg_fact_review",
            "fact_review",
            ["review_id"],
            ["review_id", "user_id"],
        )
        .unwrap()
        .references(["dim_user"])
        .unwrap();

        // Referenced table promoted after its referrer
        let err = PromotionPipeline::builder("daily_refresh")
            .promotion(reviews.clone())
            .promotion(users_promotion())
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "configuration");

        // Correct order is accepted
        assert!(PromotionPipeline::builder("daily_refresh")
            .promotion(users_promotion())
            .promotion(reviews.clone())
            .build()
            .is_ok());

        // References outside the pipeline are allowed
        assert!(PromotionPipeline::builder("daily_refresh")
            .promotion(reviews)
            .build()
            .is_ok());
    }

    #[test]
    fn test_build_rejects_empty_name() {
        assert!(PromotionPipeline::builder("  ").build().is_err());
    }

    #[tokio::test]
    async fn test_failing_check_is_logged_and_run_continues() {
        // check query (fail), detail query, log write, then the promotion
        let executor = ScriptedExecutor::new(vec![
            Ok(vec![counts_batch(3, 2)]),
            Ok(vec![crate::test_helpers::utf8_batch("failed_value", vec!["1"])]),
            Ok(vec![write_count_batch(1)]),
            Ok(vec![write_count_batch(2)]),
        ]);

        let pipeline = PromotionPipeline::builder("daily_refresh")
            .check(QualityRule::duplicate_check("stg_dim_user", "user_id").unwrap())
            .promotion(users_promotion())
            .build()
            .unwrap();

        let report = pipeline.run(&executor).await;
        assert_eq!(report.status, PipelineStatus::Completed);
        assert_eq!(report.check_results.len(), 1);
        assert_eq!(report.check_results[0].status, CheckStatus::Fail);
        assert_eq!(report.failed_checks().len(), 1);
        assert_eq!(report.promotions.len(), 1);
        assert_eq!(report.promotions[0].rows_inserted, 2);
    }

    #[tokio::test]
    async fn test_execution_error_halts_before_promotions() {
        let executor = ScriptedExecutor::new(vec![Err(StagewardError::execution(
            "SELECT ...",
            "table not found",
        ))]);

        let pipeline = PromotionPipeline::builder("daily_refresh")
            .check(QualityRule::null_check("stg_dim_user", "user_id").unwrap())
            .promotion(users_promotion())
            .build()
            .unwrap();

        let report = pipeline.run(&executor).await;
        match &report.status {
            PipelineStatus::Failed { stage, .. } => {
                assert_eq!(stage, "check Null Check on stg_dim_user");
            }
            other => panic!("expected failed status, got {other:?}"),
        }
        assert!(report.check_results.is_empty());
        assert!(report.promotions.is_empty());
        // Only the failing check query was issued
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_log_write_failure_halts_the_run() {
        let executor = ScriptedExecutor::new(vec![
            Ok(vec![counts_batch(3, 0)]),
            Err(StagewardError::execution("INSERT ...", "permission denied")),
        ]);

        let pipeline = PromotionPipeline::builder("daily_refresh")
            .check(QualityRule::null_check("stg_dim_user", "user_id").unwrap())
            .promotion(users_promotion())
            .build()
            .unwrap();

        let report = pipeline.run(&executor).await;
        match &report.status {
            PipelineStatus::Failed { stage, error } => {
                assert!(stage.starts_with("quality log write"));
                assert!(error.contains("permission denied"));
            }
            other => panic!("expected failed status, got {other:?}"),
        }
        assert!(report.promotions.is_empty());
    }

    #[tokio::test]
    async fn test_promotion_error_names_the_stage() {
        let executor = ScriptedExecutor::new(vec![
            Ok(vec![write_count_batch(1)]),
            Err(StagewardError::execution("INSERT ...", "disk full")),
        ]);

        let reviews = PromotionRule::new(
            "stg_fact_review",
            "fact_review",
            ["review_id"],
            ["review_id", "user_id"],
        )
        .unwrap();

        let pipeline = PromotionPipeline::builder("daily_refresh")
            .promotion(users_promotion())
            .promotion(reviews)
            .build()
            .unwrap();

        let report = pipeline.run(&executor).await;
        match &report.status {
            PipelineStatus::Failed { stage, .. } => {
                assert_eq!(stage, "promotion into fact_review");
            }
            other => panic!("expected failed status, got {other:?}"),
        }
        // First promotion's effect is reported even though the run failed
        assert_eq!(report.promotions.len(), 1);
        assert_eq!(report.promotions[0].production_table, "dim_user");
    }
}
