use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::MediaType;

#[derive(Parser, Debug)]
#[command(name = "chatterm")]
#[command(version)]
#[command(about = "A terminal chat client", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Show version information
    Version,
    /// Show configuration and cache status (default)
    Status,
    /// Inspect and maintain the media cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show cache statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cached files, most recently used first
    List,
    /// Drop entries whose files were deleted outside the cache
    Validate,
    /// Delete files in the cache directory that no entry tracks
    Cleanup,
    /// Run integrity and orphan sweeps, once or periodically
    Maintain {
        /// Run a single sweep and exit
        #[arg(long)]
        once: bool,
        /// Seconds between sweeps (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Delete every cached file
    Clear,
    /// Evict the least recently used file
    Evict,
    /// Change the cache size limit for this run (0 empties and disables the cache)
    Resize {
        /// New limit in bytes
        bytes: u64,
    },
    /// Print the cache key for a message's media
    #[command(allow_negative_numbers = true)]
    Key {
        chat_id: i64,
        message_id: i64,
        /// photo, video, audio, voice or document
        media_type: MediaType,
        /// Key for the thumbnail variant
        #[arg(long)]
        thumb: bool,
    },
}
