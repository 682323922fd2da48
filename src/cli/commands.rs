use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    app::{init_config, run_maintenance, spawn_maintenance, Config},
    cache::{self, generate_key, generate_thumbnail_key, CacheError},
};

use super::{CacheCommand, Commands};

/// Handle CLI subcommands
pub async fn handle_command(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Init => {
            println!("Initializing Chatterm configuration...");
            let path = init_config()?;
            println!("Configuration available at: {}", path.display());
            Ok(())
        }
        Commands::Version => {
            show_version();
            Ok(())
        }
        Commands::Status => show_status(config),
        Commands::Cache { action } => handle_cache_command(action, config).await,
    }
}

/// Show version information
pub fn show_version() {
    println!("Chatterm v{}", env!("CARGO_PKG_VERSION"));
    println!("   A terminal chat client");
}

/// Show configuration and cache status
fn show_status(config: &Config) -> Result<()> {
    println!("Chatterm Status:");
    println!();

    let cache_config = &config.cache;
    let dir = cache_config.resolved_directory()?;
    println!("{}", cache_summary(cache_config.effective_max_size(), &dir));
    if cache_config.maintenance_interval_secs > 0 {
        println!(
            "      • Maintenance every {}s",
            cache_config.maintenance_interval_secs
        );
    } else {
        println!("      • Maintenance: off");
    }

    let cache = cache::init(cache_config)?;
    let stats = cache.stats();
    println!(
        "      • {} files, {:.2} MB",
        stats.file_count,
        stats.total_size as f64 / 1_048_576.0
    );

    println!();
    Ok(())
}

/// Status lines for the cache directory and its effective limit
fn cache_summary(max_size: u64, dir: &Path) -> String {
    if max_size == 0 {
        "  [WARNING] Media cache: Disabled\n      • Limit: off".to_string()
    } else {
        format!(
            "  [OK] Media cache: {}\n      • Limit: {:.2} MB",
            dir.display(),
            max_size as f64 / 1_048_576.0
        )
    }
}

/// Handle `chatterm cache ...`
pub async fn handle_cache_command(action: &CacheCommand, config: &Config) -> Result<()> {
    // Key derivation needs no cache instance
    if let CacheCommand::Key {
        chat_id,
        message_id,
        media_type,
        thumb,
    } = action
    {
        let key = if *thumb {
            generate_thumbnail_key(*chat_id, *message_id, *media_type)
        } else {
            generate_key(*chat_id, *message_id, *media_type)
        };
        println!("{}", key);
        return Ok(());
    }

    let cache = Arc::new(cache::init(&config.cache)?);

    match action {
        CacheCommand::Stats { json } => {
            let stats = cache.stats();
            if *json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Directory: {}", cache.cache_dir().display());
                println!("{}", stats.format());
            }
        }
        CacheCommand::List => {
            for entry in cache.entries() {
                println!(
                    "{:>12}  {:<8}  {}  {}",
                    entry.file_size,
                    entry.media_type,
                    entry.access_time.format("%Y-%m-%d %H:%M:%S"),
                    entry.key.green()
                );
            }
        }
        CacheCommand::Validate => {
            let removed = cache.validate_integrity()?;
            println!("Removed {} stale entries", removed);
        }
        CacheCommand::Cleanup => {
            let removed = cache.cleanup_orphans()?;
            println!("Deleted {} orphaned files", removed);
        }
        CacheCommand::Maintain { once, interval } => {
            if *once {
                let report = run_maintenance(&cache);
                println!(
                    "Removed {} stale entries, deleted {} orphaned files",
                    report.stale_removed, report.orphans_removed
                );
            } else {
                let secs = interval.unwrap_or(config.cache.maintenance_interval_secs);
                if secs == 0 {
                    anyhow::bail!("Maintenance interval must be greater than zero");
                }
                println!("Running cache maintenance every {}s (Ctrl-C to stop)", secs);
                let handle = spawn_maintenance(Arc::clone(&cache), Duration::from_secs(secs));
                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for Ctrl-C")?;
                handle.abort();
            }
        }
        CacheCommand::Clear => {
            let count = cache.count();
            cache.clear()?;
            println!("Cleared {} cached files", count);
        }
        CacheCommand::Evict => match cache.evict() {
            Ok(entry) => println!("Evicted {} ({} bytes)", entry.key.yellow(), entry.file_size),
            Err(CacheError::Empty) => println!("Cache is empty"),
            Err(e) => return Err(e.into()),
        },
        CacheCommand::Resize { bytes } => {
            let before = cache.count();
            cache.set_max_size(*bytes)?;
            println!(
                "Limit set to {} bytes, evicted {} files",
                bytes,
                before - cache.count()
            );
        }
        CacheCommand::Key { .. } => {}
    }

    Ok(())
}
