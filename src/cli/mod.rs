//! CLI command handlers
//!
//! This module contains all CLI-related functionality including:
//! - Argument parsing structures
//! - Command implementations
//! - Logging setup

pub mod args;
pub mod commands;
pub mod help;
pub mod router;

pub use args::{Cli, Commands, ShardArgs};
pub use help::{get_log_level, init_logging};
pub use router::execute_command;
