//! Prelude for commonly used types and traits in stageward.

pub use crate::checks::{CheckResult, CheckRunner, CheckStatus, CheckType, QualityRule};
pub use crate::config::WarehouseConfig;
pub use crate::error::{Result, StagewardError};
pub use crate::executor::{DataFusionExecutor, QueryExecutor, StatementKind};
pub use crate::logging::LoggingConfig;
pub use crate::pipeline::{PipelineReport, PipelineStatus, PromotionPipeline};
pub use crate::promotion::{Promoter, PromotionOutcome, PromotionRule};
pub use crate::quality_log::QualityLogWriter;
