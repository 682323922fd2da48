// Gateway module for the media cache - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod error;
mod index;
mod integrity;
mod keys;
mod loader;
mod media_cache;
mod types;

#[cfg(test)]
mod properties;

// Public re-exports - the ONLY way to access cache functionality
pub use error::{CacheError, DeletionFailure};
pub use keys::{generate_key, generate_thumbnail_key};
pub use media_cache::MediaCache;
pub use types::{CacheEntry, CacheStats, MediaType};

/// Initialize the media cache from configuration
pub fn init(config: &crate::app::CacheConfig) -> Result<MediaCache, crate::utils::ChattermError> {
    let dir = config
        .resolved_directory()
        .map_err(|e| crate::utils::ChattermError::ConfigError(e.to_string()))?;
    Ok(MediaCache::new(dir, config.effective_max_size())?)
}
