use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, DEFAULT_CACHE_MAX_SIZE_BYTES, DEFAULT_CACHE_SUBDIR,
    DEFAULT_MAINTENANCE_INTERVAL_SECS, ENV_PREFIX, LOCAL_CONFIG_PATH,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Media cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Media cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Turn media caching on or off
    pub enabled: bool,
    /// Cache directory; a leading `~` is expanded to the home directory
    pub directory: String,
    /// Byte budget for cached media (0 disables the cache)
    pub max_size_bytes: u64,
    /// Seconds between integrity/orphan sweeps (0 disables them)
    pub maintenance_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_dir().to_string_lossy().into_owned(),
            max_size_bytes: DEFAULT_CACHE_MAX_SIZE_BYTES,
            maintenance_interval_secs: DEFAULT_MAINTENANCE_INTERVAL_SECS,
        }
    }
}

impl CacheConfig {
    /// Cache directory with `~` expanded
    pub fn resolved_directory(&self) -> Result<PathBuf> {
        expand_home(&self.directory)
    }

    /// The byte budget the cache should be constructed with
    pub fn effective_max_size(&self) -> u64 {
        if self.enabled {
            self.max_size_bytes
        } else {
            0
        }
    }
}

/// Platform cache directory (~/.cache/chatterm/media on Linux,
/// ~/Library/Caches/chatterm/media on macOS)
fn default_cache_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
        proj_dirs.cache_dir().join(DEFAULT_CACHE_SUBDIR)
    } else {
        // Fallback to ~/.cache/chatterm/media
        PathBuf::from("~")
            .join(".cache")
            .join(APP_NAME)
            .join(DEFAULT_CACHE_SUBDIR)
    }
}

fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .context("Could not determine home directory")
}

/// Expand a leading `~` or `~/` to the user's home directory
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    // Get config directories
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(LOCAL_CONFIG_PATH);

    // Build figment configuration
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    // Add global config if it exists
    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    // Add local config if it exists
    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    extract(figment)
}

/// Load configuration from an explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path));
    extract(figment)
}

fn extract(figment: Figment) -> Result<Config> {
    // Add environment variables (CHATTERM_ prefix, `__` for nesting)
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
        proj_dirs.config_dir().to_path_buf()
    } else {
        // Fallback to home directory
        home_dir()?.join(".config").join(APP_NAME)
    };
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
    }

    Ok(config_file)
}
