//! Run health report
//!
//! A small JSON document overwritten at the end of every run, meant for
//! monitoring and alerting on scrape success rates.

use crate::{GuardError, GuardResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// End-of-run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Unix timestamp (seconds) of the report
    pub ts: i64,

    /// URLs written to the success sink
    pub ok: usize,

    /// URLs in the input list
    pub total: usize,

    /// URLs written to the dead-letter sink
    pub failed: usize,

    /// Pipeline name
    pub pipeline: String,

    /// Successful URLs whose structural fingerprint changed since the last run
    pub struct_changes: usize,

    /// Identifier of the run that produced the report
    pub run_id: String,
}

impl HealthReport {
    /// Builds a report stamped with the current time
    pub fn new(
        pipeline: &str,
        run_id: &str,
        ok: usize,
        failed: usize,
        struct_changes: usize,
    ) -> Self {
        Self {
            ts: Utc::now().timestamp(),
            ok,
            total: ok + failed,
            failed,
            pipeline: pipeline.to_string(),
            struct_changes,
            run_id: run_id.to_string(),
        }
    }

    /// Fraction of URLs that succeeded (1.0 for an empty run)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.ok as f64 / self.total as f64
        }
    }
}

/// Writes the report as pretty-printed JSON, replacing any previous report
pub async fn write_health_report(path: &Path, report: &HealthReport) -> GuardResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;

    tracing::debug!("Wrote health report to {}", path.display());
    Ok(())
}

/// Reads a previously written report
pub fn read_health_report(path: &Path) -> GuardResult<HealthReport> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(GuardError::from)
}
