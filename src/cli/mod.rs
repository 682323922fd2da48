/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{CacheCommand, Cli, Commands};
pub use commands::{handle_cache_command, handle_command, show_version};
