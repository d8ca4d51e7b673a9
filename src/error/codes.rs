/// Error code registry for shardtext
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 3000-3999: Output (filesystem) errors
/// - 4000-4999: Execution errors
/// - 7000-7999: Validation errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_YAML: u16 = 1002;
    pub const CONFIG_INVALID_TOML: u16 = 1003;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_PATH_ERROR: u16 = 1006;
    pub const CONFIG_VALIDATION_FAILED: u16 = 1008;

    // Output errors (3000-3999)
    pub const OUTPUT_GENERIC: u16 = 3000;
    pub const OUTPUT_IO_ERROR: u16 = 3001;
    pub const OUTPUT_ALREADY_EXISTS: u16 = 3005;

    // Execution errors (4000-4999)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_TASK_PANICKED: u16 = 4001;
    pub const EXEC_TASK_CANCELLED: u16 = 4006;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_PARTITION_COUNT: u16 = 7001;
    pub const VALIDATION_PARTITION_OUT_OF_RANGE: u16 = 7002;
    pub const VALIDATION_RECORD_FORMAT: u16 = 7003;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Invalid YAML syntax in configuration",
        1003 => "Invalid TOML syntax in configuration",
        1005 => "Invalid value in configuration",
        1006 => "Configuration path error",
        1008 => "Configuration validation failed",

        3000 => "Generic output error",
        3001 => "Output I/O error",
        3005 => "Output shards already exist",

        4000 => "Generic execution error",
        4001 => "Shard writer task panicked",
        4006 => "Shard writer task cancelled",

        7000 => "Generic validation error",
        7001 => "Shard count must be at least one",
        7002 => "Partition index out of range",
        7003 => "Malformed record line",

        _ => "Unknown error code",
    }
}
