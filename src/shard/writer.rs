//! Parallel sharded text writer
//!
//! Records are split across exactly `num_shards` partitions and every
//! partition is written by its own task, bounded by a semaphore. Each shard is
//! written to a hidden temporary file in the output directory, flushed and
//! synced, then renamed to its final name. `write` returns only after every
//! shard task has settled.
//!
//! Dropping the `write` future abandons in-flight shards; the output
//! directory may then hold a mix of final shards and temporary files.

use super::naming::ShardNameTemplate;
use super::partition::{
    assign, HashPartitioner, Partitioner, ShardAssignment, MAX_NUM_SHARDS,
};
use super::reader::list_template_shards;
use crate::error::{ErrorCode, ShardError, ShardResult};
use crate::record::Record;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_SUFFIX: &str = ".txt";
pub const DEFAULT_MAX_PARALLEL_WRITES: usize = 4;
/// Upper bound on concurrent shard writes
pub const MAX_PARALLEL_WRITES: usize = 1024;

/// What to do with shard files already present for the same prefix/suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    /// Replace matching shards; any left over from an earlier run are removed
    #[default]
    Overwrite,
    /// Refuse to write if any matching shard exists
    FailIfExists,
}

/// Options for a sharded write
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub output_dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
    pub num_shards: usize,
    pub template: ShardNameTemplate,
    /// Materialize empty partitions as empty files
    pub force_exact_shards: bool,
    pub max_parallel_writes: usize,
    pub write_mode: WriteMode,
}

impl WriteOptions {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>, num_shards: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
            num_shards,
            template: ShardNameTemplate::default(),
            force_exact_shards: true,
            max_parallel_writes: DEFAULT_MAX_PARALLEL_WRITES,
            write_mode: WriteMode::default(),
        }
    }

    /// Split an output path such as `/data/out` into directory `/data` and prefix `out`
    pub fn from_path_prefix(path: impl AsRef<Path>, num_shards: usize) -> ShardResult<Self> {
        let (dir, prefix) = split_path_prefix(path.as_ref())?;
        Ok(Self::new(dir, prefix, num_shards))
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_template(mut self, template: ShardNameTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_force_exact_shards(mut self, force: bool) -> Self {
        self.force_exact_shards = force;
        self
    }

    pub fn with_max_parallel_writes(mut self, max_parallel: usize) -> Self {
        self.max_parallel_writes = max_parallel;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Path of one shard file
    pub fn shard_path(&self, index: usize, num_shards: usize) -> PathBuf {
        self.output_dir.join(
            self.template
                .file_name(&self.prefix, &self.suffix, index, num_shards),
        )
    }

    pub fn validate(&self) -> ShardResult<()> {
        if self.num_shards == 0 {
            return Err(ShardError::partition_count(self.num_shards));
        }
        if self.num_shards > MAX_NUM_SHARDS {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "num_shards {} exceeds the maximum of {}",
                    self.num_shards, MAX_NUM_SHARDS
                ),
            ));
        }
        if self.max_parallel_writes == 0 || self.max_parallel_writes > MAX_PARALLEL_WRITES {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                format!(
                    "max_parallel_writes must be between 1 and {} (got {})",
                    MAX_PARALLEL_WRITES, self.max_parallel_writes
                ),
            ));
        }
        if self.prefix.is_empty() {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "file prefix must not be empty",
            ));
        }
        if self.prefix.contains(['/', '\\']) || self.suffix.contains(['/', '\\']) {
            return Err(ShardError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                "file prefix and suffix must not contain path separators",
            ));
        }
        Ok(())
    }
}

fn split_path_prefix(path: &Path) -> ShardResult<(PathBuf, String)> {
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ShardError::config_with_code(
                ErrorCode::CONFIG_PATH_ERROR,
                format!("output path {} has no file prefix", path.display()),
            )
        })?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, prefix))
}

/// One materialized shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardFile {
    pub index: usize,
    pub path: PathBuf,
    pub lines: usize,
    pub bytes: u64,
    /// Hex SHA-256 of the file contents
    pub sha256: String,
}

/// Outcome of a sharded write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub num_shards: usize,
    pub files_written: usize,
    pub records_written: usize,
    pub empty_shards_skipped: usize,
    pub stale_files_removed: usize,
    /// Written shards ordered by index
    pub files: Vec<ShardFile>,
}

/// Writes records as newline-delimited text across N shard files
pub struct ShardedTextWriter {
    options: WriteOptions,
    progress: Option<ProgressBar>,
}

impl ShardedTextWriter {
    pub fn new(options: WriteOptions) -> ShardResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            progress: None,
        })
    }

    /// Report each completed shard on the given progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Partition `records` with `partitioner` and write the shards
    pub async fn write<P>(&self, records: Vec<Record>, partitioner: &P) -> ShardResult<WriteSummary>
    where
        P: Partitioner + ?Sized,
    {
        let assignment = assign(records, self.options.num_shards, partitioner)?;
        self.write_assignment(assignment).await
    }

    /// Write an existing assignment; the file count follows the assignment's shard count
    pub async fn write_assignment(&self, assignment: ShardAssignment) -> ShardResult<WriteSummary> {
        let options = &self.options;
        let num_shards = assignment.num_shards();
        let dir = options.output_dir.clone();

        info!(
            "Writing {} records into {} shard(s) under {} (max parallel: {})",
            assignment.total_records(),
            num_shards,
            dir.display(),
            options.max_parallel_writes
        );

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShardError::io("create output directory", &dir, e))?;

        let existing =
            list_template_shards(&dir, &options.prefix, &options.suffix, &options.template)
                .await?;
        if options.write_mode == WriteMode::FailIfExists && !existing.is_empty() {
            return Err(ShardError::output_exists(&dir, existing));
        }

        if let Some(progress) = &self.progress {
            progress.set_length(num_shards as u64);
        }

        let semaphore = Arc::new(Semaphore::new(options.max_parallel_writes));
        let mut tasks = FuturesUnordered::new();
        let mut empty_shards_skipped = 0;

        for (index, records) in assignment.into_shards().into_iter().enumerate() {
            if records.is_empty() && !options.force_exact_shards {
                debug!("Skipping empty shard {}", index);
                empty_shards_skipped += 1;
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
                continue;
            }

            let final_path = options.shard_path(index, num_shards);
            let semaphore = semaphore.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|_| {
                    ShardError::task(ErrorCode::EXEC_TASK_CANCELLED, "write semaphore closed")
                })?;
                write_shard(index, final_path, records).await
            }));
        }

        let mut files = Vec::with_capacity(tasks.len());
        let mut first_error = None;
        while let Some(joined) = tasks.next().await {
            let result = joined.unwrap_or_else(|e| {
                let code = if e.is_panic() {
                    ErrorCode::EXEC_TASK_PANICKED
                } else {
                    ErrorCode::EXEC_TASK_CANCELLED
                };
                Err(ShardError::task(code, e.to_string()))
            });

            match result {
                Ok(file) => {
                    debug!(
                        "Wrote shard {} ({} lines, {} bytes) to {}",
                        file.index,
                        file.lines,
                        file.bytes,
                        file.path.display()
                    );
                    if let Some(progress) = &self.progress {
                        progress.inc(1);
                    }
                    files.push(file);
                }
                Err(e) => {
                    warn!("Shard write failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        files.sort_by_key(|file| file.index);

        let written: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let mut stale_files_removed = 0;
        for stale in existing.iter().filter(|p| !written.contains(p.as_path())) {
            fs::remove_file(stale)
                .await
                .map_err(|e| ShardError::io("remove stale shard", stale, e))?;
            debug!("Removed stale shard {}", stale.display());
            stale_files_removed += 1;
        }

        let summary = WriteSummary {
            num_shards,
            files_written: files.len(),
            records_written: files.iter().map(|f| f.lines).sum(),
            empty_shards_skipped,
            stale_files_removed,
            files,
        };

        info!(
            "Wrote {} file(s) with {} records ({} empty shard(s) skipped, {} stale removed)",
            summary.files_written,
            summary.records_written,
            summary.empty_shards_skipped,
            summary.stale_files_removed
        );

        Ok(summary)
    }
}

/// Write one shard through a temporary file and rename it into place
async fn write_shard(index: usize, final_path: PathBuf, records: Vec<Record>) -> ShardResult<ShardFile> {
    let temp_path = temp_path_for(&final_path);

    match write_lines(&temp_path, &records).await {
        Ok((bytes, sha256)) => {
            fs::rename(&temp_path, &final_path)
                .await
                .map_err(|e| ShardError::io("move shard into place", &final_path, e))?;
            Ok(ShardFile {
                index,
                path: final_path,
                lines: records.len(),
                bytes,
                sha256,
            })
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                debug!(
                    "Could not remove temporary shard {}: {}",
                    temp_path.display(),
                    cleanup
                );
            }
            Err(e)
        }
    }
}

fn temp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    final_path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
}

async fn write_lines(path: &Path, records: &[Record]) -> ShardResult<(u64, String)> {
    let io_err = |e| ShardError::io("write shard", path, e);

    let file = fs::File::create(path).await.map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    let mut hasher = Sha256::new();
    let mut bytes = 0u64;

    for record in records {
        let line = format!("{}\n", record);
        writer.write_all(line.as_bytes()).await.map_err(io_err)?;
        hasher.update(line.as_bytes());
        bytes += line.len() as u64;
    }

    writer.flush().await.map_err(io_err)?;
    writer.into_inner().sync_all().await.map_err(io_err)?;

    Ok((bytes, format!("{:x}", hasher.finalize())))
}

/// Write `records` into exactly `num_shards` files named `<prefix>-*<suffix>`
/// in `output_dir`, returning the number of files written.
///
/// Uses hash partitioning and materializes empty shards.
pub async fn write_sharded_text(
    records: Vec<Record>,
    num_shards: usize,
    output_dir: impl Into<PathBuf>,
    prefix: &str,
    suffix: &str,
) -> ShardResult<usize> {
    let options = WriteOptions::new(output_dir, prefix, num_shards).with_suffix(suffix);
    let summary = ShardedTextWriter::new(options)?
        .write(records, &HashPartitioner)
        .await?;
    Ok(summary.files_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::partition::RoundRobinPartitioner;
    use crate::shard::reader::{list_shards, read_shard_lines};
    use tempfile::TempDir;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new("hi", 5),
            Record::new("there", 1),
            Record::new("sue", 2),
            Record::new("bob", 2),
        ]
    }

    #[tokio::test]
    async fn test_writes_exact_shard_count() {
        let temp = TempDir::new().unwrap();
        let options = WriteOptions::new(temp.path(), "out", 3);
        let writer = ShardedTextWriter::new(options).unwrap();

        let summary = writer
            .write(sample_records(), &HashPartitioner)
            .await
            .unwrap();

        assert_eq!(summary.files_written, 3);
        assert_eq!(summary.records_written, 4);
        assert_eq!(
            summary.files.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(temp.path().join("out-00000-of-00003.txt").exists());
        assert!(temp.path().join("out-00002-of-00003.txt").exists());
    }

    #[tokio::test]
    async fn test_skips_empty_shards_without_force() {
        let temp = TempDir::new().unwrap();
        let options = WriteOptions::new(temp.path(), "out", 3).with_force_exact_shards(false);
        let writer = ShardedTextWriter::new(options).unwrap();

        let summary = writer
            .write(vec![Record::new("only", 1)], &RoundRobinPartitioner)
            .await
            .unwrap();

        assert_eq!(summary.files_written, 1);
        assert_eq!(summary.empty_shards_skipped, 2);
        assert!(temp.path().join("out-00000-of-00003.txt").exists());
    }

    #[tokio::test]
    async fn test_rejects_zero_shards_before_touching_disk() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("never-created");
        let result = ShardedTextWriter::new(WriteOptions::new(&dir, "out", 0));
        assert!(matches!(result, Err(ShardError::PartitionCount { .. })));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_creates_missing_output_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        let count = write_sharded_text(sample_records(), 2, &dir, "out", ".txt")
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_output_dir_that_is_a_file_fails_with_io() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("blocker");
        std::fs::write(&file, "x").unwrap();

        let result = write_sharded_text(sample_records(), 2, &file, "out", ".txt").await;
        assert!(matches!(result, Err(ShardError::Io { .. })));
    }

    #[tokio::test]
    async fn test_overwrite_removes_stale_shards() {
        let temp = TempDir::new().unwrap();
        write_sharded_text(sample_records(), 5, temp.path(), "out", ".txt")
            .await
            .unwrap();

        let options = WriteOptions::new(temp.path(), "out", 2);
        let summary = ShardedTextWriter::new(options)
            .unwrap()
            .write(sample_records(), &HashPartitioner)
            .await
            .unwrap();

        assert_eq!(summary.stale_files_removed, 5);
        let shards = list_shards(temp.path(), "out", ".txt").await.unwrap();
        assert_eq!(shards.len(), 2);

        let mut lines = read_shard_lines(temp.path(), "out", ".txt").await.unwrap();
        lines.sort();
        assert_eq!(lines, vec!["bob: 2", "hi: 5", "sue: 2", "there: 1"]);
    }

    #[tokio::test]
    async fn test_fail_if_exists() {
        let temp = TempDir::new().unwrap();
        write_sharded_text(sample_records(), 1, temp.path(), "out", ".txt")
            .await
            .unwrap();

        let options =
            WriteOptions::new(temp.path(), "out", 1).with_write_mode(WriteMode::FailIfExists);
        let result = ShardedTextWriter::new(options)
            .unwrap()
            .write(sample_records(), &HashPartitioner)
            .await;
        assert!(matches!(result, Err(ShardError::OutputExists { .. })));
    }

    #[tokio::test]
    async fn test_checksum_matches_contents() {
        let temp = TempDir::new().unwrap();
        let options = WriteOptions::new(temp.path(), "out", 1);
        let summary = ShardedTextWriter::new(options)
            .unwrap()
            .write(vec![Record::new("hi", 5)], &HashPartitioner)
            .await
            .unwrap();

        let file = &summary.files[0];
        let content = std::fs::read(&file.path).unwrap();
        assert_eq!(content, b"hi: 5\n");
        assert_eq!(file.bytes, 6);
        assert_eq!(file.sha256, format!("{:x}", Sha256::digest(b"hi: 5\n")));
    }

    #[tokio::test]
    async fn test_no_temporary_files_left_behind() {
        let temp = TempDir::new().unwrap();
        write_sharded_text(sample_records(), 4, temp.path(), "out", ".txt")
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_from_path_prefix() {
        let options = WriteOptions::from_path_prefix("/data/run/out", 3).unwrap();
        assert_eq!(options.output_dir, PathBuf::from("/data/run"));
        assert_eq!(options.prefix, "out");

        let options = WriteOptions::from_path_prefix("out", 3).unwrap();
        assert_eq!(options.output_dir, PathBuf::from("."));

        assert!(WriteOptions::from_path_prefix("/", 3).is_err());
    }

    #[test]
    fn test_validate_rejects_separators() {
        let options = WriteOptions::new("/tmp", "a/b", 1);
        assert!(options.validate().is_err());
        let options = WriteOptions::new("/tmp", "out", 1).with_suffix("/x");
        assert!(options.validate().is_err());
        let options = WriteOptions::new("/tmp", "out", 1).with_max_parallel_writes(0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_requests() {
        let options = WriteOptions::new("/tmp", "out", MAX_NUM_SHARDS + 1);
        assert!(matches!(
            options.validate(),
            Err(ShardError::Config {
                code: ErrorCode::CONFIG_INVALID_VALUE,
                ..
            })
        ));

        let options =
            WriteOptions::new("/tmp", "out", 2).with_max_parallel_writes(MAX_PARALLEL_WRITES + 1);
        assert!(matches!(
            options.validate(),
            Err(ShardError::Config {
                code: ErrorCode::CONFIG_INVALID_VALUE,
                ..
            })
        ));

        let options = WriteOptions::new("/tmp", "out", MAX_NUM_SHARDS)
            .with_max_parallel_writes(MAX_PARALLEL_WRITES);
        assert!(options.validate().is_ok());
    }

    #[tokio::test]
    async fn test_existing_files_from_colliding_prefixes_are_left_alone() {
        let temp = TempDir::new().unwrap();
        write_sharded_text(sample_records(), 1, temp.path(), "out-b", ".txt")
            .await
            .unwrap();
        std::fs::write(temp.path().join("out-notes.txt"), "keep\n").unwrap();

        let options =
            WriteOptions::new(temp.path(), "out", 1).with_write_mode(WriteMode::FailIfExists);
        ShardedTextWriter::new(options)
            .unwrap()
            .write(sample_records(), &HashPartitioner)
            .await
            .unwrap();

        let summary = ShardedTextWriter::new(WriteOptions::new(temp.path(), "out", 2))
            .unwrap()
            .write(sample_records(), &HashPartitioner)
            .await
            .unwrap();
        assert_eq!(summary.stale_files_removed, 1);

        assert!(temp.path().join("out-b-00000-of-00001.txt").exists());
        assert_eq!(
            std::fs::read_to_string(temp.path().join("out-notes.txt")).unwrap(),
            "keep\n"
        );
        assert!(!temp.path().join("out-00000-of-00001.txt").exists());
    }
}
