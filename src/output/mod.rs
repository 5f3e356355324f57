//! Output module for run artifacts
//!
//! This module handles:
//! - Serialized JSONL sinks for extracted records and dead letters
//! - The end-of-run health report
//! - Triage summaries of the dead-letter sink

mod health;
mod sink;
pub mod triage;

pub use health::{read_health_report, write_health_report, HealthReport};
pub use sink::JsonlSink;
pub use triage::{load_triage, print_triage, summarize_dead_letters, TriageEntry};
