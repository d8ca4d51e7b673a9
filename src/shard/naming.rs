//! Shard file naming
//!
//! A shard file is named `<prefix><template><suffix>` where the template holds
//! runs of `S` (shard index) and `N` (shard count), each zero-padded to the
//! run's length. The default template `-SSSSS-of-NNNNN` yields names such as
//! `out-00001-of-00003.txt`.

use crate::error::{ErrorCode, ShardError, ShardResult};
use glob::{MatchOptions, Pattern};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SHARD_TEMPLATE: &str = "-SSSSS-of-NNNNN";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Index(usize),
    Count(usize),
}

/// Parsed shard name template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShardNameTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl ShardNameTemplate {
    /// Parse a template; it must start with `-` and contain at least one `S` run
    pub fn parse(raw: &str) -> ShardResult<Self> {
        if !raw.starts_with('-') {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("shard template {:?} must start with '-'", raw),
            ));
        }
        if raw.contains(['/', '\\']) {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("shard template {:?} must not contain path separators", raw),
            ));
        }

        let mut segments = Vec::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                'S' | 'N' => {
                    let mut width = 1;
                    while chars.peek() == Some(&c) {
                        chars.next();
                        width += 1;
                    }
                    segments.push(if c == 'S' {
                        Segment::Index(width)
                    } else {
                        Segment::Count(width)
                    });
                }
                other => match segments.last_mut() {
                    Some(Segment::Literal(text)) => text.push(other),
                    _ => segments.push(Segment::Literal(other.to_string())),
                },
            }
        }

        if !segments.iter().any(|s| matches!(s, Segment::Index(_))) {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("shard template {:?} has no shard index (S) placeholder", raw),
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Expand the template for one shard
    pub fn expand(&self, index: usize, num_shards: usize) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Index(width) => format!("{:0width$}", index, width = *width),
                Segment::Count(width) => format!("{:0width$}", num_shards, width = *width),
            })
            .collect()
    }

    /// Full file name of one shard
    pub fn file_name(&self, prefix: &str, suffix: &str, index: usize, num_shards: usize) -> String {
        format!("{}{}{}", prefix, self.expand(index, num_shards), suffix)
    }

    /// Anchored regex source accepting exactly the names `file_name` can produce
    fn name_pattern(&self, prefix: &str, suffix: &str) -> String {
        let body: String = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => regex::escape(text),
                Segment::Index(width) | Segment::Count(width) => format!(r"\d{{{},}}", width),
            })
            .collect();
        format!("^{}{}{}$", regex::escape(prefix), body, regex::escape(suffix))
    }
}

impl Default for ShardNameTemplate {
    fn default() -> Self {
        Self::parse(DEFAULT_SHARD_TEMPLATE).expect("default shard template is valid")
    }
}

impl FromStr for ShardNameTemplate {
    type Err = ShardError;

    fn from_str(s: &str) -> ShardResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShardNameTemplate {
    type Error = ShardError;

    fn try_from(value: String) -> ShardResult<Self> {
        Self::parse(&value)
    }
}

impl From<ShardNameTemplate> for String {
    fn from(template: ShardNameTemplate) -> Self {
        template.raw
    }
}

impl fmt::Display for ShardNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Matches file names of the form `<prefix>-*<suffix>`
#[derive(Debug, Clone)]
pub struct ShardFileMatcher {
    pattern: Pattern,
}

impl ShardFileMatcher {
    pub fn new(prefix: &str, suffix: &str) -> ShardResult<Self> {
        let raw = format!("{}-*{}", Pattern::escape(prefix), Pattern::escape(suffix));
        let pattern = Pattern::new(&raw).map_err(|e| {
            ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("cannot build shard pattern {:?}", raw),
            )
            .with_source(e)
        })?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        self.pattern.matches_with(file_name, options)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Matches only the file names a [`ShardNameTemplate`] produces for one
/// prefix and suffix.
///
/// Used wherever existing files may be replaced or removed, so that another
/// prefix sharing the same leading text (`out-b-...` next to `out-...`) and
/// unrelated files such as `out-notes.txt` are never touched.
#[derive(Debug, Clone)]
pub struct TemplateFileMatcher {
    regex: Regex,
}

impl TemplateFileMatcher {
    pub fn new(template: &ShardNameTemplate, prefix: &str, suffix: &str) -> ShardResult<Self> {
        let raw = template.name_pattern(prefix, suffix);
        let regex = Regex::new(&raw).map_err(|e| {
            ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!("cannot build shard pattern {:?}", raw),
            )
            .with_source(e)
        })?;
        Ok(Self { regex })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
