//! Selector fallback extraction
//!
//! A pipeline names its field by an ordered list of selector candidates. The
//! first candidate producing a non-empty value wins, and the result records
//! which candidate and strategy produced it so template drift shows up in the
//! output long before the last fallback stops matching.

use scraper::{Html, Selector};
use serde::Deserialize;
use std::fmt;

/// How a candidate expression is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorStrategy {
    /// CSS selector; the value is the trimmed text of the first match
    Css,
    /// `selector::attribute`; the value is that attribute of the first match
    Attr,
}

impl SelectorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Attr => "attr",
        }
    }
}

impl fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(strategy, expression)` fallback
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorCandidate {
    pub strategy: SelectorStrategy,
    pub expr: String,
}

impl SelectorCandidate {
    pub fn new(strategy: SelectorStrategy, expr: impl Into<String>) -> Self {
        Self {
            strategy,
            expr: expr.into(),
        }
    }
}

/// Result of running the candidates against a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The extracted value, if any candidate matched
    pub value: Option<String>,

    /// Strategy of the winning candidate
    pub strategy: Option<SelectorStrategy>,

    /// Position of the winning candidate in the candidate list
    pub index: Option<usize>,
}

impl Extraction {
    /// The "nothing matched" sentinel
    pub fn none() -> Self {
        Self {
            value: None,
            strategy: None,
            index: None,
        }
    }

    /// Strategy name as written to the success sink (`none` when unmatched)
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.map_or("none", |s| s.as_str())
    }

    /// Candidate index as written to the success sink (`-1` when unmatched)
    pub fn index_value(&self) -> i64 {
        self.index.map_or(-1, |i| i as i64)
    }
}

/// Pulls one field out of a raw document
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &str) -> Extraction;
}

/// A candidate with its selector parsed up front
#[derive(Debug)]
struct CompiledCandidate {
    strategy: SelectorStrategy,
    selector: Option<Selector>,
    attribute: String,
}

/// [`Extractor`] backed by ordered CSS/attribute selector fallbacks
#[derive(Debug)]
pub struct SelectorExtractor {
    candidates: Vec<CompiledCandidate>,
}

impl SelectorExtractor {
    /// Compiles the candidates
    ///
    /// Expressions that fail to parse are kept in place (so indices still
    /// line up with the configuration) but never match.
    pub fn new(candidates: &[SelectorCandidate]) -> Self {
        let candidates = candidates
            .iter()
            .map(|candidate| {
                let (css, attribute) = match candidate.strategy {
                    SelectorStrategy::Css => (candidate.expr.as_str(), ""),
                    SelectorStrategy::Attr => candidate
                        .expr
                        .split_once("::")
                        .unwrap_or((candidate.expr.as_str(), "")),
                };

                let selector = match Selector::parse(css.trim()) {
                    Ok(selector) => Some(selector),
                    Err(e) => {
                        tracing::warn!("Ignoring invalid selector '{}': {:?}", candidate.expr, e);
                        None
                    }
                };

                CompiledCandidate {
                    strategy: candidate.strategy,
                    selector,
                    attribute: attribute.trim().to_string(),
                }
            })
            .collect();

        Self { candidates }
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, document: &str) -> Extraction {
        let html = Html::parse_document(document);

        for (index, candidate) in self.candidates.iter().enumerate() {
            let Some(selector) = &candidate.selector else {
                continue;
            };
            let Some(element) = html.select(selector).next() else {
                continue;
            };

            let value = match candidate.strategy {
                SelectorStrategy::Css => {
                    let text = element
                        .text()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ");
                    Some(text).filter(|t| !t.is_empty())
                }
                SelectorStrategy::Attr => element
                    .value()
                    .attr(&candidate.attribute)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            };

            if let Some(value) = value {
                return Extraction {
                    value: Some(value),
                    strategy: Some(candidate.strategy),
                    index: Some(index),
                };
            }
        }

        Extraction::none()
    }
}
