/// Constants module to avoid magic numbers in the codebase

// Cache Configuration
pub const DEFAULT_CACHE_MAX_SIZE_BYTES: u64 = 512 * 1024 * 1024; // 512 MiB
pub const DEFAULT_CACHE_SUBDIR: &str = "media";
pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 600; // 10 minutes

// Cache Keys
pub const THUMBNAIL_KEY_SUFFIX: &str = "_thumb";

// Config
pub const APP_NAME: &str = "chatterm";
pub const ENV_PREFIX: &str = "CHATTERM_";
pub const LOCAL_CONFIG_PATH: &str = ".chatterm/config.toml";

// Media File Extensions (lowercase, without the dot)
pub const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "heic", "tiff",
];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "avi", "m4v"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "flac", "wav", "aac"];
pub const VOICE_EXTENSIONS: &[&str] = &["ogg", "oga", "opus"];
