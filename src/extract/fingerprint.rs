//! Structural fingerprints for template drift detection
//!
//! A fingerprint hashes the `tag:classnames` skeleton of a document, so it is
//! blind to text changes but flips when elements are added, removed or
//! re-classed.

use scraper::{ElementRef, Html};
use sha2::{Digest, Sha256};

/// Outcome of comparing two snapshots of the same URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralDiff {
    /// True iff a previous fingerprint existed and differs from the current one
    pub changed: bool,
    pub prev_fingerprint: Option<String>,
    pub curr_fingerprint: String,
}

/// Compares a previous snapshot (if any) with the current document
pub trait DiffDetector: Send + Sync {
    fn diff(&self, previous: Option<&str>, current: &str) -> StructuralDiff;
}

/// [`DiffDetector`] comparing structural fingerprints
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintDiff;

impl DiffDetector for FingerprintDiff {
    fn diff(&self, previous: Option<&str>, current: &str) -> StructuralDiff {
        diff_summary(previous, current)
    }
}

/// Hex SHA-256 over the `|`-joined `tag:classnames` tokens of every element,
/// in document order
pub fn structural_fingerprint(html: &str) -> String {
    let document = Html::parse_document(html);

    let tokens: Vec<String> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .map(|el| {
            let classes = el
                .value()
                .attr("class")
                .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            format!("{}:{}", el.value().name(), classes)
        })
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(tokens.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

/// Diffs two documents; an absent or empty previous snapshot never counts as a change
pub fn diff_summary(previous: Option<&str>, current: &str) -> StructuralDiff {
    let prev_fingerprint = previous
        .filter(|p| !p.is_empty())
        .map(structural_fingerprint);
    let curr_fingerprint = structural_fingerprint(current);

    let changed = prev_fingerprint
        .as_ref()
        .is_some_and(|prev| *prev != curr_fingerprint);

    StructuralDiff {
        changed,
        prev_fingerprint,
        curr_fingerprint,
    }
}
