//! Document collaborators used by the pipeline
//!
//! - `selectors`: ordered selector fallbacks for field extraction
//! - `fingerprint`: structural fingerprints and snapshot diffing

mod fingerprint;
mod selectors;

pub use fingerprint::{diff_summary, structural_fingerprint, DiffDetector, FingerprintDiff, StructuralDiff};
pub use selectors::{Extraction, Extractor, SelectorCandidate, SelectorExtractor, SelectorStrategy};
