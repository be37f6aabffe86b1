use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// In-process TTL cache for list responses, shared across handlers via
/// cloning. Writers call `clear` to drop every entry at once.
#[derive(Clone)]
pub struct ListCache<T> {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, Entry<T>>>>,
}

impl<T: Clone> ListCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached value when present and younger than the TTL.
    /// Expired entries are removed on the way out.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().expect("list cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, value: T) {
        let mut entries = self.entries.lock().expect("list cache mutex poisoned");
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Wholesale invalidation. Any write to the underlying data calls this
    /// rather than hunting down affected keys.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("list cache mutex poisoned");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("list cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl() {
        let cache = ListCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache: ListCache<i32> = ListCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn clear_drops_everything() {
        let cache = ListCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn clones_share_entries() {
        let cache = ListCache::new(Duration::from_secs(60));
        let other = cache.clone();
        cache.insert("a".to_string(), 7);
        assert_eq!(other.get("a"), Some(7));
        other.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ListCache::new(Duration::from_millis(20));
        cache.insert("a".to_string(), 1);
        tokio_test::block_on(async {
            tokio::time::sleep(Duration::from_millis(40)).await;
        });
        assert_eq!(cache.get("a"), None);
        // Expired lookup removed the entry as well.
        assert!(cache.is_empty());
    }
}
