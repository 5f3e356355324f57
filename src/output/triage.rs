//! Dead-letter triage
//!
//! Groups the dead-letter sink by error message and ranks the groups by
//! frequency, so the dominant failure mode of a run is the first line printed.

use crate::GuardResult;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Label for lines that are not valid JSON
pub const PARSE_ERROR: &str = "PARSE_ERROR";

/// Label for records without an `error` field
pub const UNKNOWN_ERROR: &str = "UNKNOWN";

/// Longest message prefix printed per entry
const MESSAGE_WIDTH: usize = 160;

/// One group of identical failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageEntry {
    pub error: String,
    pub count: usize,
}

/// Counts dead-letter lines by error message
///
/// Entries are sorted by count (descending), then by message. Blank lines are
/// ignored.
pub fn summarize_dead_letters(content: &str) -> Vec<TriageEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let error = match serde_json::from_str::<Value>(line) {
            Ok(record) => match record.get("error") {
                Some(Value::String(message)) => message.clone(),
                Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
                Some(other) => other.to_string(),
            },
            Err(_) => PARSE_ERROR.to_string(),
        };
        *counts.entry(error).or_insert(0) += 1;
    }

    let mut entries: Vec<TriageEntry> = counts
        .into_iter()
        .map(|(error, count)| TriageEntry { error, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.error.cmp(&b.error)));
    entries
}

/// Loads and summarizes a dead-letter file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_triage(path: &Path) -> GuardResult<Option<Vec<TriageEntry>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(summarize_dead_letters(&content)))
}

/// Prints a triage summary to stdout
pub fn print_triage(entries: &[TriageEntry]) {
    println!("Dead-letter summary:");
    for entry in entries {
        let message: String = entry.error.chars().take(MESSAGE_WIDTH).collect();
        println!("  - ({}) {}", entry.count, message);
    }
}
