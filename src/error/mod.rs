use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Result type for shard operations
pub type ShardResult<T> = Result<T, ShardError>;

/// The unified error type for shardtext
#[derive(Error, Debug)]
pub enum ShardError {
    #[error("[E{code:04}] I/O error at {}: {message}", .path.display())]
    Io {
        code: u16,
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[E{code:04}] Invalid shard count {requested}: at least one shard is required")]
    PartitionCount { code: u16, requested: usize },

    #[error("[E{code:04}] Partitioner assigned shard {index} but only {num_shards} shard(s) exist")]
    PartitionOutOfRange {
        code: u16,
        index: usize,
        num_shards: usize,
    },

    #[error(
        "[E{code:04}] Output already exists: {} shard file(s) in {}",
        .existing.len(),
        .dir.display()
    )]
    OutputExists {
        code: u16,
        dir: PathBuf,
        existing: Vec<PathBuf>,
    },

    #[error("[E{code:04}] Malformed record line {line:?}: {reason}")]
    RecordParse {
        code: u16,
        line: String,
        reason: String,
    },

    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Shard task failed: {message}")]
    Task { code: u16, message: String },
}

impl ShardError {
    /// Create an I/O error for the given path
    pub fn io(message: impl Into<String>, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            code: ErrorCode::OUTPUT_IO_ERROR,
            message: message.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Reject a shard count below one
    pub fn partition_count(requested: usize) -> Self {
        Self::PartitionCount {
            code: ErrorCode::VALIDATION_PARTITION_COUNT,
            requested,
        }
    }

    pub fn partition_out_of_range(index: usize, num_shards: usize) -> Self {
        Self::PartitionOutOfRange {
            code: ErrorCode::VALIDATION_PARTITION_OUT_OF_RANGE,
            index,
            num_shards,
        }
    }

    pub fn output_exists(dir: impl AsRef<Path>, existing: Vec<PathBuf>) -> Self {
        Self::OutputExists {
            code: ErrorCode::OUTPUT_ALREADY_EXISTS,
            dir: dir.as_ref().to_path_buf(),
            existing,
        }
    }

    pub fn record_parse(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RecordParse {
            code: ErrorCode::VALIDATION_RECORD_FORMAT,
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn task(code: u16, message: impl Into<String>) -> Self {
        Self::Task {
            code,
            message: message.into(),
        }
    }

    /// Add a source error to a configuration error.
    ///
    /// Variants with a mandatory typed source are returned unchanged.
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        if let Self::Config { source: src, .. } = &mut self {
            *src = Some(source.into());
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Io { code, .. }
            | Self::PartitionCount { code, .. }
            | Self::PartitionOutOfRange { code, .. }
            | Self::OutputExists { code, .. }
            | Self::RecordParse { code, .. }
            | Self::Config { code, .. }
            | Self::Task { code, .. } => *code,
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Io { .. } | Self::OutputExists { .. } => 4,
            Self::Task { .. } => 5,
            Self::PartitionCount { .. }
            | Self::PartitionOutOfRange { .. }
            | Self::RecordParse { .. } => 8,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                message,
                path,
                source,
                ..
            } => format!("Could not {} at {}: {}", message, path.display(), source),
            Self::PartitionCount { requested, .. } => {
                format!("Shard count must be at least 1 (got {})", requested)
            }
            Self::OutputExists { dir, existing, .. } => format!(
                "{} shard file(s) already exist in {}; remove them or use overwrite mode",
                existing.len(),
                dir.display()
            ),
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            other => other.to_string(),
        }
    }
}
