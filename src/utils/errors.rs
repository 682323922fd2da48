use thiserror::Error;

use crate::cache::CacheError;

/// Main error type for Chatterm
#[derive(Error, Debug)]
pub enum ChattermError {
    #[error("Cache error: {0}")]
    CacheError(#[from] CacheError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
