use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{generate_key, generate_thumbnail_key, MediaCache, MediaType};

/// One piece of downloadable media attached to a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediaRequest {
    pub chat_id: i64,
    pub message_id: i64,
    pub media_type: MediaType,
    /// Request the small preview instead of the full-resolution file
    pub thumbnail: bool,
}

impl MediaRequest {
    pub fn new(chat_id: i64, message_id: i64, media_type: MediaType) -> Self {
        Self {
            chat_id,
            message_id,
            media_type,
            thumbnail: false,
        }
    }

    pub fn thumbnail(chat_id: i64, message_id: i64, media_type: MediaType) -> Self {
        Self {
            thumbnail: true,
            ..Self::new(chat_id, message_id, media_type)
        }
    }

    /// Cache key for this request
    pub fn key(&self) -> String {
        if self.thumbnail {
            generate_thumbnail_key(self.chat_id, self.message_id, self.media_type)
        } else {
            generate_key(self.chat_id, self.message_id, self.media_type)
        }
    }
}

/// Fetches media from the chat service; implemented by the protocol client
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download the media into `destination` and return the number of bytes written
    async fn download(&self, request: &MediaRequest, destination: &Path) -> Result<u64>;
}

/// Serves media from the cache, downloading and caching it on a miss
pub struct DownloadCoordinator<D> {
    cache: Arc<MediaCache>,
    downloader: D,
}

impl<D: MediaDownloader> DownloadCoordinator<D> {
    pub fn new(cache: Arc<MediaCache>, downloader: D) -> Self {
        Self { cache, downloader }
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Return a local path for the requested media.
    ///
    /// A failure to cache a successful download is logged and the download
    /// is still returned; the cache never breaks the download pipeline.
    pub async fn fetch(&self, request: MediaRequest) -> Result<PathBuf> {
        let key = request.key();

        if let Some(path) = self.cache.get(&key) {
            debug!("Media cache hit for {}", key);
            return Ok(path);
        }

        let destination = self.cache.path_for_key(&key);
        let size = self
            .downloader
            .download(&request, &destination)
            .await
            .with_context(|| format!("Failed to download {}", key))?;

        if let Err(e) = self
            .cache
            .put_with_type(&key, &destination, size, request.media_type)
        {
            warn!("Failed to cache {}: {}", key, e);
        }

        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn writes_bytes(len: usize) -> impl Fn(&MediaRequest, &Path) -> Result<u64> + Send {
        move |_, destination| {
            fs::write(destination, vec![7u8; len])?;
            Ok(len as u64)
        }
    }

    #[test]
    fn test_request_keys() {
        assert_eq!(MediaRequest::new(10, 20, MediaType::Audio).key(), "10_20_audio");
        assert_eq!(
            MediaRequest::thumbnail(10, 20, MediaType::Video).key(),
            "10_20_video_thumb"
        );
    }

    #[tokio::test]
    async fn test_fetch_downloads_once_then_hits_cache() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(MediaCache::new(dir.path(), 4096).unwrap());

        let mut downloader = MockMediaDownloader::new();
        downloader
            .expect_download()
            .times(1)
            .returning(writes_bytes(64));

        let coordinator = DownloadCoordinator::new(Arc::clone(&cache), downloader);
        let request = MediaRequest::new(1, 2, MediaType::Photo);

        let first = coordinator.fetch(request).await.unwrap();
        let second = coordinator.fetch(request).await.unwrap();

        assert_eq!(first, dir.path().join("1_2_photo"));
        assert_eq!(first, second);
        assert_eq!(cache.size(), 64);

        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[tokio::test]
    async fn test_thumbnail_and_full_size_are_cached_separately() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(MediaCache::new(dir.path(), 4096).unwrap());

        let mut downloader = MockMediaDownloader::new();
        downloader
            .expect_download()
            .times(2)
            .returning(writes_bytes(16));

        let coordinator = DownloadCoordinator::new(Arc::clone(&cache), downloader);
        coordinator
            .fetch(MediaRequest::new(3, 4, MediaType::Video))
            .await
            .unwrap();
        coordinator
            .fetch(MediaRequest::thumbnail(3, 4, MediaType::Video))
            .await
            .unwrap();

        assert_eq!(cache.count(), 2);
        assert!(cache.contains("3_4_video"));
        assert!(cache.contains("3_4_video_thumb"));
    }

    #[tokio::test]
    async fn test_download_failure_is_propagated() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(MediaCache::new(dir.path(), 4096).unwrap());

        let mut downloader = MockMediaDownloader::new();
        downloader
            .expect_download()
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));

        let coordinator = DownloadCoordinator::new(Arc::clone(&cache), downloader);
        let err = coordinator
            .fetch(MediaRequest::new(5, 6, MediaType::Document))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("5_6_document"));
        assert_eq!(cache.count(), 0);
    }

    #[tokio::test]
    async fn test_cache_failure_still_returns_download() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(MediaCache::new(dir.path(), 8).unwrap());

        let mut downloader = MockMediaDownloader::new();
        downloader
            .expect_download()
            .returning(writes_bytes(32));

        let coordinator = DownloadCoordinator::new(Arc::clone(&cache), downloader);
        let path = coordinator
            .fetch(MediaRequest::new(7, 8, MediaType::Voice))
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(cache.count(), 0);
    }
}
