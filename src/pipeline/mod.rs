//! Pipeline orchestration
//!
//! This module contains the concurrent run loop and the pieces it writes to:
//! - `Orchestrator`: one task per URL, bounded concurrency, health report
//! - `PipelineRecord`: the terminal outcome of one URL
//! - `SnapshotCache`: last fetched document per URL, for structural diffs

mod orchestrator;
mod record;
mod snapshot;

pub use orchestrator::{Orchestrator, RunSummary, SCRAPE_FAIL};
pub use record::{DeadLetter, ExtractedRecord, PipelineRecord};
pub use snapshot::{list_snapshots, SnapshotCache};
