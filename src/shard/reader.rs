//! Enumerating and reading back shard files
//!
//! Shards are discovered by name in a single directory, either loosely
//! (`<prefix>-*<suffix>`) or strictly by the names a template produces.
//! Hidden temporary files left by an interrupted write never match.

use super::naming::{ShardFileMatcher, ShardNameTemplate, TemplateFileMatcher};
use crate::error::{ShardError, ShardResult};
use crate::record::{parse_records, Record};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, trace};

/// List files named `<prefix>-*<suffix>` in `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub async fn list_shards(dir: &Path, prefix: &str, suffix: &str) -> ShardResult<Vec<PathBuf>> {
    let matcher = ShardFileMatcher::new(prefix, suffix)?;
    list_matching(dir, matcher.as_str(), |name| matcher.matches(name)).await
}

/// List only the files `template` names for `prefix` and `suffix`, sorted by path.
///
/// A missing directory yields an empty list.
pub async fn list_template_shards(
    dir: &Path,
    prefix: &str,
    suffix: &str,
    template: &ShardNameTemplate,
) -> ShardResult<Vec<PathBuf>> {
    let matcher = TemplateFileMatcher::new(template, prefix, suffix)?;
    list_matching(dir, matcher.as_str(), |name| matcher.matches(name)).await
}

async fn list_matching<F>(dir: &Path, pattern: &str, matches: F) -> ShardResult<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ShardError::io("read output directory", dir, e)),
    };

    let mut shards = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ShardError::io("read output directory", dir, e))?
    {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !matches(name) {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| ShardError::io("inspect shard file", entry.path(), e))?;
        if file_type.is_file() {
            trace!("Found shard {}", name);
            shards.push(entry.path());
        }
    }

    shards.sort();
    debug!(
        "Found {} shard(s) matching {} in {}",
        shards.len(),
        pattern,
        dir.display()
    );
    Ok(shards)
}

/// Read the lines of a single shard
pub async fn read_shard(path: &Path) -> ShardResult<Vec<String>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ShardError::io("read shard", path, e))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Read every line of every matching shard, shard by shard in path order
pub async fn read_shard_lines(dir: &Path, prefix: &str, suffix: &str) -> ShardResult<Vec<String>> {
    let mut lines = Vec::new();
    for path in list_shards(dir, prefix, suffix).await? {
        lines.extend(read_shard(&path).await?);
    }
    Ok(lines)
}

/// Read and parse every record of every matching shard
pub async fn read_records(dir: &Path, prefix: &str, suffix: &str) -> ShardResult<Vec<Record>> {
    let lines = read_shard_lines(dir, prefix, suffix).await?;
    parse_records(lines.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let shards = list_shards(&temp.path().join("absent"), "out", ".txt")
            .await
            .unwrap();
        assert!(shards.is_empty());
    }

    #[tokio::test]
    async fn test_lists_only_matching_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        std::fs::write(dir.join("out-00001-of-00002.txt"), "b: 2\n").unwrap();
        std::fs::write(dir.join("out-00000-of-00002.txt"), "a: 1\n").unwrap();
        std::fs::write(dir.join("out.txt"), "nope\n").unwrap();
        std::fs::write(dir.join("other-00000.txt"), "nope\n").unwrap();
        std::fs::write(dir.join(".out-00000-of-00002.txt.x.tmp"), "nope\n").unwrap();
        std::fs::create_dir(dir.join("out-dir.txt")).unwrap();

        let shards = list_shards(dir, "out", ".txt").await.unwrap();
        let names: Vec<_> = shards
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["out-00000-of-00002.txt", "out-00001-of-00002.txt"]);

        let records = read_records(dir, "out", ".txt").await.unwrap();
        assert_eq!(records, vec![Record::new("a", 1), Record::new("b", 2)]);
    }

    #[tokio::test]
    async fn test_empty_shard_has_no_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out-0.txt");
        std::fs::write(&path, "").unwrap();
        assert!(read_shard(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_template_listing_ignores_colliding_names() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        std::fs::write(dir.join("out-00000-of-00001.txt"), "a: 1\n").unwrap();
        std::fs::write(dir.join("out-b-00000-of-00001.txt"), "b: 1\n").unwrap();
        std::fs::write(dir.join("out-notes.txt"), "keep\n").unwrap();

        let strict = list_template_shards(dir, "out", ".txt", &ShardNameTemplate::default())
            .await
            .unwrap();
        assert_eq!(strict, vec![dir.join("out-00000-of-00001.txt")]);

        let loose = list_shards(dir, "out", ".txt").await.unwrap();
        assert_eq!(loose.len(), 3);
    }
}
