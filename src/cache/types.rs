use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{
    AUDIO_EXTENSIONS, PHOTO_EXTENSIONS, THUMBNAIL_KEY_SUFFIX, VIDEO_EXTENSIONS, VOICE_EXTENSIONS,
};

/// Coarse classification of a cached media blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
    Audio,
    Voice,
    Document,
}

impl MediaType {
    /// All media types, in key order
    pub const ALL: [MediaType; 5] = [
        MediaType::Photo,
        MediaType::Video,
        MediaType::Audio,
        MediaType::Voice,
        MediaType::Document,
    ];

    /// Lowercase name used inside cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Voice => "voice",
            MediaType::Document => "document",
        }
    }

    /// Classify a file by its extension, if the extension is a known media extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let ext = ext.as_str();

        if PHOTO_EXTENSIONS.contains(&ext) {
            Some(MediaType::Photo)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaType::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Some(MediaType::Audio)
        } else if VOICE_EXTENSIONS.contains(&ext) {
            Some(MediaType::Voice)
        } else {
            None
        }
    }

    /// Read the media type segment of a `{chat}_{message}_{type}[_thumb]` key
    pub fn from_key(key: &str) -> Option<Self> {
        // Keys discovered on disk may be nested paths or carry an extension
        let name = key.rsplit('/').next().unwrap_or(key);
        let name = name.split('.').next().unwrap_or(name);
        let name = name.strip_suffix(THUMBNAIL_KEY_SUFFIX).unwrap_or(name);

        name.rsplit('_').next().and_then(|segment| segment.parse().ok())
    }

    /// Infer the media type of a blob: extension first, then the key, then document
    pub fn infer(key: &str, path: &Path) -> Self {
        Self::from_extension(path)
            .or_else(|| Self::from_key(key))
            .unwrap_or(MediaType::Document)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown media type: {}", s))
    }
}

/// Metadata for one cached file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// Backing file, written by the caller; the cache only tracks it
    pub file_path: PathBuf,
    /// Authoritative size used for accounting
    pub file_size: u64,
    pub media_type: MediaType,
    pub access_time: DateTime<Utc>,
    pub download_time: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a fresh entry with both timestamps set to now
    pub fn new(key: String, file_path: PathBuf, file_size: u64, media_type: MediaType) -> Self {
        let now = Utc::now();
        Self {
            key,
            file_path,
            file_size,
            media_type,
            access_time: now,
            download_time: now,
        }
    }
}

/// Point-in-time statistics for a media cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_size: u64,
    pub max_size: u64,
    pub file_count: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
    pub oldest_access_time: Option<DateTime<Utc>>,
    pub newest_access_time: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Hits as a percentage of all lookups
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total > 0 {
            (self.hit_count as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Format cache stats for display
    pub fn format(&self) -> String {
        let time = |t: Option<DateTime<Utc>>| {
            t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string())
        };

        format!(
            "Media Cache Statistics:\n\
            Files: {}\n\
            Size: {:.2} MB of {:.2} MB\n\
            Hit Rate: {:.1}% ({} hits, {} misses)\n\
            Evictions: {}\n\
            Oldest Access: {}\n\
            Newest Access: {}",
            self.file_count,
            self.total_size as f64 / 1_048_576.0,
            self.max_size as f64 / 1_048_576.0,
            self.hit_rate(),
            self.hit_count,
            self.miss_count,
            self.eviction_count,
            time(self.oldest_access_time),
            time(self.newest_access_time),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(
            MediaType::from_extension(Path::new("a/b.JPG")),
            Some(MediaType::Photo)
        );
        assert_eq!(
            MediaType::from_extension(Path::new("clip.webm")),
            Some(MediaType::Video)
        );
        assert_eq!(
            MediaType::from_extension(Path::new("song.flac")),
            Some(MediaType::Audio)
        );
        assert_eq!(
            MediaType::from_extension(Path::new("note.opus")),
            Some(MediaType::Voice)
        );
        assert_eq!(MediaType::from_extension(Path::new("report.pdf")), None);
        assert_eq!(MediaType::from_extension(Path::new("no_extension")), None);
    }

    #[test]
    fn test_media_type_from_key() {
        assert_eq!(MediaType::from_key("42_7_video"), Some(MediaType::Video));
        assert_eq!(
            MediaType::from_key("42_7_photo_thumb"),
            Some(MediaType::Photo)
        );
        assert_eq!(
            MediaType::from_key("chats/42_7_voice.bin"),
            Some(MediaType::Voice)
        );
        assert_eq!(MediaType::from_key("random-name"), None);
    }

    #[test]
    fn test_media_type_infer_prefers_extension() {
        assert_eq!(
            MediaType::infer("1_2_video", Path::new("/c/1_2_video.png")),
            MediaType::Photo
        );
        assert_eq!(
            MediaType::infer("1_2_audio", Path::new("/c/1_2_audio")),
            MediaType::Audio
        );
        assert_eq!(
            MediaType::infer("misc", Path::new("/c/misc.txt")),
            MediaType::Document
        );
    }

    #[test]
    fn test_media_type_round_trips_through_str() {
        for media_type in MediaType::ALL {
            assert_eq!(media_type.to_string().parse::<MediaType>(), Ok(media_type));
        }
        assert!("sticker".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.hit_count = 3;
        stats.miss_count = 1;
        assert_eq!(stats.hit_rate(), 75.0);
    }

    #[test]
    fn test_stats_format() {
        let stats = CacheStats {
            total_size: 1_048_576,
            max_size: 2_097_152,
            file_count: 4,
            hit_count: 1,
            miss_count: 1,
            eviction_count: 2,
            ..Default::default()
        };

        let text = stats.format();
        assert!(text.contains("Files: 4"));
        assert!(text.contains("Size: 1.00 MB of 2.00 MB"));
        assert!(text.contains("Hit Rate: 50.0%"));
        assert!(text.contains("Evictions: 2"));
        assert!(text.contains("Oldest Access: -"));
    }

    #[test]
    fn test_stats_serialization() {
        let stats = CacheStats {
            total_size: 12345,
            file_count: 1,
            ..Default::default()
        };

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"total_size\":12345"));

        let back: CacheStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
