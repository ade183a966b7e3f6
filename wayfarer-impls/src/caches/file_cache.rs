use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use parking_lot::Mutex;
use wayfarer_core::{CacheEntry, CacheKey, ClientCache};

/// A client cache that survives restarts by keeping one JSON file per entry.
///
/// Read and write failures are logged and treated as misses.
pub struct FileCache {
    directory: PathBuf,
    /// Serializes writes so readers never see a half written file
    write_lock: Mutex<()>,
}

impl FileCache {
    /// Opens a cache in the given directory, creating it if needed.
    pub fn open(directory: impl AsRef<Path>) -> io::Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            write_lock: Mutex::new(()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(format!("{}.json", key.as_flat()))
    }
}

impl ClientCache for FileCache {
    fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.path_for(key);

        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read cache entry {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cache entry {} is corrupt, ignoring it: {}", key, e);
                None
            }
        }
    }

    fn put(&self, key: CacheKey, entry: CacheEntry) {
        let contents = match serde_json::to_vec(&entry) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not serialize cache entry {}: {}", key, e);
                return;
            }
        };

        let path = self.path_for(&key);
        let temporary = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock();
        let result = fs::write(&temporary, contents).and_then(|_| fs::rename(&temporary, &path));

        if let Err(e) = result {
            warn!("Could not write cache entry {}: {}", key, e);
        }
    }

    fn remove(&self, key: &CacheKey) {
        let _guard = self.write_lock.lock();

        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove cache entry {}: {}", key, e),
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        fs,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use chrono::{Duration, Utc};
    use wayfarer_core::{CacheKey, ClientCache, ClientCacheExt};

    use super::FileCache;

    static DIRECTORY_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temporary_cache() -> FileCache {
        let directory = std::env::temp_dir().join(format!(
            "wayfarer-cache-test-{}-{}",
            std::process::id(),
            DIRECTORY_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        FileCache::open(directory).unwrap()
    }

    #[test]
    fn entries_survive_reopening() {
        let cache = temporary_cache();
        let key = CacheKey::Answers {
            room_id: 3,
            member_id: 9,
        };
        let now = Utc::now();

        cache.write(key.clone(), &vec!["Hotel".to_string()], now);

        let reopened = FileCache::open(cache.directory()).unwrap();
        let value: Option<Vec<String>> = reopened.read_fresh(&key, now, Duration::hours(1));

        assert_eq!(value, Some(vec!["Hotel".to_string()]));

        reopened.remove(&key);
        assert!(cache.get(&key).is_none());

        fs::remove_dir_all(cache.directory()).unwrap();
    }

    #[test]
    fn corrupt_entries_are_misses() {
        let cache = temporary_cache();
        let key = CacheKey::Questions(1);

        fs::write(cache.path_for(&key), b"{ not json").unwrap();

        assert!(cache.get(&key).is_none());

        fs::remove_dir_all(cache.directory()).unwrap();
    }
}
