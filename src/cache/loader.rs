use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};
use tracing::warn;

use super::types::{CacheEntry, MediaType};

/// A regular file found under the cache directory
#[derive(Debug, Clone)]
pub(crate) struct DiskFile {
    /// Path relative to the cache root, `/`-separated
    pub key: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Recursively list every regular file under `root`.
///
/// Unreadable entries are logged and skipped, so a partial walk still
/// returns whatever could be read.
pub(crate) fn scan_files(root: &Path) -> Vec<DiskFile> {
    let mut walker = WalkBuilder::new(root);
    walker
        .standard_filters(false) // Cache contents are never ignore-filtered
        .hidden(false)
        .follow_links(false);

    let mut files = Vec::new();
    for result in walker.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable cache entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let Some(key) = relative_key(root, path) else {
            continue;
        };

        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        files.push(DiskFile {
            key,
            path: path.to_path_buf(),
            size: metadata.len(),
            modified,
        });
    }

    files
}

/// Rebuild cache entries from the files under `root`, ordered newest first.
///
/// Both timestamps come from the file's modification time. Sorting by it
/// (ties broken by key) makes the first eviction after a restart remove the
/// file that was written longest ago, independent of walk order.
pub(crate) fn load_entries(root: &Path) -> Vec<CacheEntry> {
    let mut files = scan_files(root);
    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.key.cmp(&b.key)));

    files
        .into_iter()
        .map(|file| {
            let media_type = MediaType::infer(&file.key, &file.path);
            CacheEntry {
                key: file.key,
                file_path: file.path,
                file_size: file.size,
                media_type,
                access_time: file.modified,
                download_time: file.modified,
            }
        })
        .collect()
}

/// Cache key for a file: its path relative to `root`, joined with `/`
pub(crate) fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
