//! Aggregation of input lines into key/count records
//!
//! Aggregators are injected into the pipeline explicitly. The word-count
//! aggregator tokenizes free text, while the pre-counted aggregator accepts
//! lines that are already rendered records and merges duplicate keys.

pub mod word_count;

pub use word_count::WordCountAggregator;

use crate::error::ShardResult;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Turns input lines into aggregated records
pub trait Aggregator: Send + Sync {
    fn aggregate(&self, lines: &[String]) -> ShardResult<Aggregation>;
}

/// Output of an aggregation step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Records sorted by key
    pub records: Vec<Record>,
    /// Summary statistics for the step
    pub stats: AggregationStats,
}

/// Summary statistics for an aggregation step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    /// Number of input lines seen
    pub input_lines: u64,
    /// Number of zero-length input lines
    pub empty_lines: u64,
    /// Sum of all counts
    pub total_count: u64,
    /// Number of distinct keys
    pub distinct_keys: usize,
}

impl Aggregation {
    /// Build an aggregation from per-key counts
    pub fn from_counts(counts: BTreeMap<String, u64>, input_lines: u64, empty_lines: u64) -> Self {
        let total_count = counts.values().sum();
        let distinct_keys = counts.len();
        let records = counts
            .into_iter()
            .map(|(key, count)| Record { key, count })
            .collect();

        Self {
            records,
            stats: AggregationStats {
                input_lines,
                empty_lines,
                total_count,
                distinct_keys,
            },
        }
    }
}

/// Aggregator for lines that already hold `"<key>: <count>"` records.
///
/// Blank lines are skipped; repeated keys are summed.
#[derive(Debug, Clone, Default)]
pub struct PrecountedAggregator;

impl Aggregator for PrecountedAggregator {
    fn aggregate(&self, lines: &[String]) -> ShardResult<Aggregation> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut empty_lines = 0;

        for line in lines {
            if line.trim().is_empty() {
                empty_lines += 1;
                continue;
            }
            let record: Record = line.parse()?;
            *counts.entry(record.key).or_default() += record.count;
        }

        Ok(Aggregation::from_counts(
            counts,
            lines.len() as u64,
            empty_lines,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShardError;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_precounted_merges_duplicate_keys() {
        let aggregation = PrecountedAggregator
            .aggregate(&lines(&["hi: 2", "bob: 1", "", "hi: 3"]))
            .unwrap();

        assert_eq!(
            aggregation.records,
            vec![Record::new("bob", 1), Record::new("hi", 5)]
        );
        assert_eq!(aggregation.stats.input_lines, 4);
        assert_eq!(aggregation.stats.empty_lines, 1);
        assert_eq!(aggregation.stats.total_count, 6);
        assert_eq!(aggregation.stats.distinct_keys, 2);
    }

    #[test]
    fn test_precounted_rejects_malformed_line() {
        let result = PrecountedAggregator.aggregate(&lines(&["hi: 2", "oops"]));
        assert!(matches!(result, Err(ShardError::RecordParse { .. })));
    }
}
