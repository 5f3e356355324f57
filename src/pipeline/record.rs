//! Per-URL output records

use crate::extract::{Extraction, StructuralDiff};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::{Deserialize, Serialize as DeriveSerialize};

/// A successfully fetched and extracted URL
///
/// Serialized as `{url, <field>, selector_idx, selector_strategy,
/// struct_changed}` where `<field>` is the pipeline's output field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub url: String,
    pub field: String,
    pub value: Option<String>,
    pub selector_idx: i64,
    pub selector_strategy: String,
    pub struct_changed: bool,
}

impl ExtractedRecord {
    pub fn new(url: &str, field: &str, extraction: &Extraction, diff: &StructuralDiff) -> Self {
        Self {
            url: url.to_string(),
            field: field.to_string(),
            value: extraction.value.clone(),
            selector_idx: extraction.index_value(),
            selector_strategy: extraction.strategy_name().to_string(),
            struct_changed: diff.changed,
        }
    }
}

impl Serialize for ExtractedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("url", &self.url)?;
        map.serialize_entry(&self.field, &self.value)?;
        map.serialize_entry("selector_idx", &self.selector_idx)?;
        map.serialize_entry("selector_strategy", &self.selector_strategy)?;
        map.serialize_entry("struct_changed", &self.struct_changed)?;
        map.end()
    }
}

/// A URL that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, DeriveSerialize, Deserialize)]
pub struct DeadLetter {
    pub url: String,
    pub error: String,
}

impl DeadLetter {
    pub fn new(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            error: error.to_string(),
        }
    }
}

/// The terminal outcome of one input URL
///
/// Every URL of a run ends as exactly one of these, appended to exactly one
/// sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineRecord {
    Extracted(ExtractedRecord),
    Failed(DeadLetter),
}

impl PipelineRecord {
    pub fn url(&self) -> &str {
        match self {
            PipelineRecord::Extracted(record) => &record.url,
            PipelineRecord::Failed(letter) => &letter.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineRecord::Extracted(_))
    }
}
