use super::types::MediaType;
use crate::constants::THUMBNAIL_KEY_SUFFIX;

/// Generate the cache key for a message's media: `{chat_id}_{message_id}_{media_type}`
pub fn generate_key(chat_id: i64, message_id: i64, media_type: MediaType) -> String {
    format!("{}_{}_{}", chat_id, message_id, media_type)
}

/// Generate the cache key for a thumbnail, distinct from the full-resolution key
pub fn generate_thumbnail_key(chat_id: i64, message_id: i64, media_type: MediaType) -> String {
    format!(
        "{}{}",
        generate_key(chat_id, message_id, media_type),
        THUMBNAIL_KEY_SUFFIX
    )
}
