//! Randomised operation sequences checking the cache's accounting invariants

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

use super::MediaCache;

#[derive(Debug, Clone)]
enum Op {
    Put { key: u8, size: u64 },
    Get { key: u8 },
    Remove { key: u8 },
    Evict,
    SetMaxSize { max: u64 },
    Clear,
    DeleteFile { key: u8 },
    Validate,
    CleanupOrphans,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..6, 0u64..800).prop_map(|(key, size)| Op::Put { key, size }),
        3 => (0u8..6).prop_map(|key| Op::Get { key }),
        1 => (0u8..6).prop_map(|key| Op::Remove { key }),
        1 => Just(Op::Evict),
        1 => (0u64..3000).prop_map(|max| Op::SetMaxSize { max }),
        1 => Just(Op::Clear),
        1 => (0u8..6).prop_map(|key| Op::DeleteFile { key }),
        1 => Just(Op::Validate),
        1 => Just(Op::CleanupOrphans),
    ]
}

fn key_name(key: u8) -> String {
    format!("100_{}_photo", key)
}

fn check_invariants(cache: &MediaCache, successful_puts: usize) -> Result<(), TestCaseError> {
    let state = cache.state.read();

    let sum: u64 = state.index.iter().map(|e| e.file_size).sum();
    prop_assert_eq!(state.current_size, sum);

    let from_map: BTreeSet<&str> = state.index.keys().collect();
    let from_list: BTreeSet<&str> = state.index.iter().map(|e| e.key.as_str()).collect();
    prop_assert_eq!(&from_map, &from_list);
    prop_assert_eq!(state.index.iter().count(), state.index.len());

    prop_assert!(state.index.len() <= successful_puts);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn accounting_holds_for_any_operation_sequence(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let dir = TempDir::new().unwrap();
        let cache = MediaCache::new(dir.path(), 2000).unwrap();
        let mut successful_puts = 0;
        let mut last_evictions = 0;

        for op in ops {
            match op {
                Op::Put { key, size } => {
                    let path = cache.path_for_key(&key_name(key));
                    fs::write(&path, vec![0u8; (key as usize) + 1]).unwrap();
                    if cache.put(&key_name(key), &path, size).is_ok() {
                        successful_puts += 1;
                    }
                }
                Op::Get { key } => {
                    if let Some(path) = cache.get(&key_name(key)) {
                        prop_assert!(path.exists());
                    }
                }
                Op::Remove { key } => {
                    cache.remove(&key_name(key)).unwrap();
                    prop_assert!(!cache.contains(&key_name(key)));
                }
                Op::Evict => {
                    let _ = cache.evict();
                }
                Op::SetMaxSize { max } => {
                    let was_disabled = cache.max_size() == 0;
                    cache.set_max_size(max).unwrap();
                    // Re-enabling adopts whatever files are in the directory
                    if was_disabled {
                        successful_puts += cache.count();
                    }
                    if max > 0 {
                        prop_assert!(cache.size() <= max);
                    } else {
                        prop_assert_eq!(cache.count(), 0);
                    }
                }
                Op::Clear => {
                    cache.clear().unwrap();
                    prop_assert_eq!(cache.size(), 0);
                }
                Op::DeleteFile { key } => {
                    let _ = fs::remove_file(cache.path_for_key(&key_name(key)));
                }
                Op::Validate => {
                    cache.validate_integrity().unwrap();
                }
                Op::CleanupOrphans => {
                    cache.cleanup_orphans().unwrap();
                }
            }

            let evictions = cache.stats().eviction_count;
            prop_assert!(evictions >= last_evictions);
            last_evictions = evictions;

            check_invariants(&cache, successful_puts)?;
        }
    }

    #[test]
    fn put_then_get_round_trips(size in 1u64..1000, max in 1000u64..5000) {
        let dir = TempDir::new().unwrap();
        let cache = MediaCache::new(dir.path(), max).unwrap();
        let path = cache.path_for_key("5_6_video");
        fs::write(&path, b"x").unwrap();

        cache.put("5_6_video", &path, size).unwrap();

        prop_assert_eq!(cache.get("5_6_video"), Some(path));
        prop_assert_eq!(cache.stats().eviction_count, 0);
    }
}
