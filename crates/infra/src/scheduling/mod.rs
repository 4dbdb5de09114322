//! Scheduling infrastructure for periodic analysis
//!
//! Cron-based scheduling of batch analysis jobs (nightly usage-pattern
//! detection). Schedulers have explicit start/stop lifecycles, track their
//! join handles, support cancellation and wrap every async step in a timeout.

pub mod analysis_scheduler;
pub mod error;

pub use analysis_scheduler::{
    AnalysisJob, AnalysisRunStats, AnalysisScheduler, AnalysisSchedulerConfig, PatternDetectionJob,
};
pub use error::{SchedulerError, SchedulerResult};
