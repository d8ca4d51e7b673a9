//! Command implementation modules
//!
//! Each command is implemented as a separate module.

pub mod cat;
pub mod config;
pub mod shard;

pub use cat::run_cat_command;
pub use config::run_config_command;
pub use shard::{run_shard_command, InputKind};
