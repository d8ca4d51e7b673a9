//! Word counting over free text lines

use super::{Aggregation, Aggregator};
use crate::error::ShardResult;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

/// Anything that is not a letter or an apostrophe separates words
static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z']+").expect("Invalid regex pattern"));

/// Pure: split a line into its words, dropping empty tokens
pub fn extract_words(line: &str) -> impl Iterator<Item = &str> {
    WORD_SEPARATOR.split(line).filter(|word| !word.is_empty())
}

/// Case-sensitive word counter
#[derive(Debug, Clone, Default)]
pub struct WordCountAggregator;

impl WordCountAggregator {
    pub fn new() -> Self {
        Self
    }
}

impl Aggregator for WordCountAggregator {
    fn aggregate(&self, lines: &[String]) -> ShardResult<Aggregation> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut empty_lines = 0;

        for line in lines {
            if line.is_empty() {
                empty_lines += 1;
            }
            for word in extract_words(line) {
                *counts.entry(word.to_string()).or_default() += 1;
            }
        }

        debug!(
            "Counted {} distinct words across {} lines ({} empty)",
            counts.len(),
            lines.len(),
            empty_lines
        );

        Ok(Aggregation::from_counts(
            counts,
            lines.len() as u64,
            empty_lines,
        ))
    }
}
