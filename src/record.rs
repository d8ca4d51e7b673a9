//! Key/count records and their text rendering
//!
//! A record is rendered as a single line `"<key>: <count>"`. Parsing splits on
//! the last `": "` so keys that themselves contain the separator survive a
//! render/parse cycle.

use crate::error::{ShardError, ShardResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between key and count in a rendered record
pub const RECORD_SEPARATOR: &str = ": ";

/// One aggregated key and its count
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub count: u64,
}

impl Record {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }

    /// Render as a text line without the trailing newline
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, RECORD_SEPARATOR, self.count)
    }
}

impl FromStr for Record {
    type Err = ShardError;

    fn from_str(line: &str) -> ShardResult<Self> {
        let (key, count) = line
            .rsplit_once(RECORD_SEPARATOR)
            .ok_or_else(|| ShardError::record_parse(line, "missing \": \" separator"))?;

        let count = count
            .trim()
            .parse::<u64>()
            .map_err(|e| ShardError::record_parse(line, format!("invalid count: {}", e)))?;

        Ok(Self::new(key, count))
    }
}

impl From<(String, u64)> for Record {
    fn from((key, count): (String, u64)) -> Self {
        Self { key, count }
    }
}

impl From<(&str, u64)> for Record {
    fn from((key, count): (&str, u64)) -> Self {
        Self::new(key, count)
    }
}

/// Parse every non-blank line as a record
pub fn parse_records<'a, I>(lines: I) -> ShardResult<Vec<Record>>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.parse::<Record>())
        .collect()
}
