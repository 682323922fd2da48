pub mod app;
pub mod cache;
pub mod cli;
pub mod constants;
pub mod media;
pub mod utils;

pub use app::{load_config, CacheConfig, Config};
pub use cache::{CacheError, CacheStats, MediaCache, MediaType};
pub use media::{DownloadCoordinator, MediaDownloader, MediaRequest};
pub use utils::ChattermError;
