//! LRU Store Module
//!
//! Thread-safe cache facade combining the recency list with capacity
//! enforcement, lazy TTL expiry and eviction callbacks.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::record::expiry_from_ttl;
use crate::cache::recency::{Position, RecencyList};

/// Callback invoked with the key and value of each evicted record.
pub type OnEvicted<V> = Box<dyn Fn(String, V) + Send + Sync>;

/// Why a record left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvictReason {
    Capacity,
    Expired,
    Oldest,
}

// == Inner State ==
/// Everything guarded by the cache lock.
struct Inner<V> {
    list: RecencyList<V>,
    /// Zero means no bound
    max_entries: usize,
    /// Zero means records never expire
    ttl: Duration,
    on_evicted: Option<OnEvicted<V>>,
}

impl<V> Inner<V> {
    /// Resolves a key to a live record, evicting it first if it has expired.
    fn live(&mut self, key: &str) -> Option<Position> {
        let pos = self.list.load(key)?;
        if self.list.get(pos)?.is_expired() {
            self.evict(pos, EvictReason::Expired);
            return None;
        }
        Some(pos)
    }

    /// Removes a record, then hands it to the callback.
    ///
    /// The record is out of the structure before the callback runs, so a
    /// panicking callback cannot leave a half-evicted entry behind.
    fn evict(&mut self, pos: Position, reason: EvictReason) {
        let Some(record) = self.list.evict(pos) else {
            return;
        };
        debug!(key = %record.key, ?reason, len = self.list.len(), "Evicted record");
        if let Some(on_evicted) = &self.on_evicted {
            on_evicted(record.key, record.value);
        }
    }

    /// Evicts from the back until the bound holds.
    fn enforce_capacity(&mut self) {
        if self.max_entries == 0 {
            return;
        }
        while self.list.len() > self.max_entries {
            match self.list.back() {
                Some(pos) => self.evict(pos, EvictReason::Capacity),
                None => break,
            }
        }
    }
}

// == LRU ==
/// Fixed-capacity, thread-safe LRU cache with optional TTL.
///
/// Every operation takes the instance's lock for its full duration, including
/// any eviction it triggers, so operations never interleave.
///
/// # Eviction callback
/// The callback set with [`Lru::set_on_evicted`] fires once per record that
/// leaves through capacity eviction, [`Lru::remove_oldest`] or TTL expiry. It
/// never fires for [`Lru::delete`] or [`Lru::clear`]. It runs on the calling
/// thread while the lock is held: it must not call back into the same cache
/// (that deadlocks) and should be quick.
pub struct Lru<V> {
    inner: Mutex<Inner<V>>,
}

impl<V> Lru<V> {
    // == Constructor ==
    /// Creates an empty cache bounded to `max_entries` records.
    ///
    /// A bound of zero disables automatic eviction; the caller is then
    /// responsible for capacity, e.g. through [`Lru::remove_oldest`].
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                list: RecencyList::new(),
                max_entries,
                ttl: Duration::ZERO,
                on_evicted: None,
            }),
        }
    }

    // == Configuration ==
    /// Returns the capacity bound (zero = unbounded).
    pub fn max_entries(&self) -> usize {
        self.inner.lock().max_entries
    }

    /// Changes the capacity bound. A lower bound is applied on the next store.
    pub fn set_max_entries(&self, max_entries: usize) {
        self.inner.lock().max_entries = max_entries;
    }

    /// Returns the TTL applied to written records (zero = never expires).
    pub fn ttl(&self) -> Duration {
        self.inner.lock().ttl
    }

    /// Sets the TTL for records written from now on.
    pub fn set_ttl(&self, ttl: Duration) {
        self.inner.lock().ttl = ttl;
    }

    /// Installs the eviction callback, replacing any previous one.
    pub fn set_on_evicted<F>(&self, on_evicted: F)
    where
        F: Fn(String, V) + Send + Sync + 'static,
    {
        self.inner.lock().on_evicted = Some(Box::new(on_evicted));
    }

    // == Store ==
    /// Sets the value for a key and marks it most recently used.
    ///
    /// Evicts least recently used records if the store pushed the cache
    /// over its bound.
    pub fn store(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.inner.lock();

        let expires_at = expiry_from_ttl(inner.ttl);
        let pos = inner.list.store(&key, value, expires_at);
        inner.list.move_to_front(pos);
        trace!(key = %key, "Stored record");

        inner.enforce_capacity();
    }

    // == Update ==
    /// Replaces the value for a key without touching its recency.
    ///
    /// The record's expiry is refreshed. Absent or expired keys are left
    /// absent.
    pub fn update(&self, key: &str, value: V) {
        let mut inner = self.inner.lock();

        if inner.live(key).is_none() {
            return;
        }
        let expires_at = expiry_from_ttl(inner.ttl);
        inner.list.update(key, value, expires_at);
    }

    // == Delete ==
    /// Removes a key. Does nothing if the key is absent.
    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.list.load(key) {
            inner.list.evict(pos);
        }
    }

    // == Remove Oldest ==
    /// Evicts the least recently used record, if any.
    pub fn remove_oldest(&self) {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.list.back() {
            inner.evict(pos, EvictReason::Oldest);
        }
    }

    // == Length ==
    /// Returns the number of records held.
    ///
    /// Expired records that have not been accessed since expiring still count.
    pub fn len(&self) -> usize {
        self.inner.lock().list.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.inner.lock().list.is_empty()
    }

    // == Clear ==
    /// Drops every record without invoking the eviction callback.
    pub fn clear(&self) {
        self.inner.lock().list.clear();
    }

    // == Keys ==
    /// Returns a snapshot of the keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().list.keys()
    }
}

impl<V: Clone> Lru<V> {
    // == Load ==
    /// Returns the value for a key and marks it most recently used.
    ///
    /// Returns None if the key is absent or has expired.
    pub fn load(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let pos = inner.live(key)?;
        inner.list.move_to_front(pos);
        let value = inner.list.get(pos).map(|record| record.value.clone());
        trace!(key = %key, hit = value.is_some(), "Loaded record");
        value
    }

    // == Peek ==
    /// Returns the value for a key without touching its recency.
    ///
    /// Returns None if the key is absent or has expired.
    pub fn peek(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let pos = inner.live(key)?;
        inner.list.get(pos).map(|record| record.value.clone())
    }
}

impl<V> Default for Lru<V> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<V> fmt::Debug for Lru<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Lru")
            .field("len", &inner.list.len())
            .field("max_entries", &inner.max_entries)
            .field("ttl", &inner.ttl)
            .field("has_on_evicted", &inner.on_evicted.is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread::sleep;

    type Evictions = Arc<Mutex<Vec<(String, String)>>>;

    fn recording_cache(max_entries: usize) -> (Lru<String>, Evictions) {
        let cache = Lru::new(max_entries);
        let evictions: Evictions = Arc::new(Mutex::new(Vec::new()));
        let sink = evictions.clone();
        cache.set_on_evicted(move |key, value| sink.lock().push((key, value)));
        (cache, evictions)
    }

    fn evicted_keys(evictions: &Evictions) -> Vec<String> {
        evictions.lock().iter().map(|(key, _)| key.clone()).collect()
    }

    #[test]
    fn test_store_new() {
        let cache: Lru<String> = Lru::new(100);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.max_entries(), 100);
        assert_eq!(cache.ttl(), Duration::ZERO);
    }

    #[test]
    fn test_store_and_load() {
        let cache = Lru::new(100);

        cache.store("key1", "value1".to_string());

        assert_eq!(cache.load("key1"), Some("value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_nonexistent() {
        let cache: Lru<String> = Lru::new(100);
        assert_eq!(cache.load("nonexistent"), None);
        assert_eq!(cache.peek("nonexistent"), None);
    }

    #[test]
    fn test_store_overwrite() {
        let cache = Lru::new(100);

        cache.store("key1", "value1".to_string());
        cache.store("key1", "value2".to_string());

        assert_eq!(cache.load("key1"), Some("value2".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction_order() {
        let (cache, evictions) = recording_cache(2);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        cache.store("c", "3".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["c", "b"]);
        assert_eq!(cache.load("a"), None);
        assert!(cache.load("b").is_some());
        assert!(cache.load("c").is_some());
        assert_eq!(*evictions.lock(), vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_load_promotes_recency() {
        let (cache, evictions) = recording_cache(2);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        cache.load("a");
        cache.store("c", "3".to_string());

        assert_eq!(evicted_keys(&evictions), vec!["b"]);
        assert!(cache.peek("a").is_some());
        assert!(cache.peek("b").is_none());
    }

    #[test]
    fn test_peek_does_not_promote() {
        let (cache, evictions) = recording_cache(2);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        assert_eq!(cache.peek("a"), Some("1".to_string()));
        cache.store("c", "3".to_string());

        assert_eq!(evicted_keys(&evictions), vec!["a"]);
        assert!(cache.peek("b").is_some());
    }

    #[test]
    fn test_update_does_not_reorder() {
        let (cache, evictions) = recording_cache(2);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        cache.update("a", "new".to_string());

        assert_eq!(cache.peek("a"), Some("new".to_string()));
        assert_eq!(cache.keys(), vec!["b", "a"]);

        cache.store("c", "3".to_string());

        // The callback sees the value current at eviction time
        assert_eq!(*evictions.lock(), vec![("a".to_string(), "new".to_string())]);
    }

    #[test]
    fn test_update_missing_key_is_noop() {
        let cache = Lru::new(2);

        cache.update("missing", "value".to_string());

        assert!(cache.is_empty());
        assert_eq!(cache.load("missing"), None);
    }

    #[test]
    fn test_store_existing_key_promotes() {
        let (cache, evictions) = recording_cache(2);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        cache.store("a", "again".to_string());
        cache.store("c", "3".to_string());

        assert_eq!(evicted_keys(&evictions), vec!["b"]);
        assert_eq!(cache.peek("a"), Some("again".to_string()));
    }

    #[test]
    fn test_delete_does_not_invoke_callback() {
        let (cache, evictions) = recording_cache(10);

        cache.store("key1", "value1".to_string());
        cache.delete("key1");

        assert!(cache.is_empty());
        assert_eq!(cache.load("key1"), None);
        assert!(evictions.lock().is_empty());
    }

    #[test]
    fn test_delete_nonexistent_is_noop() {
        let cache = Lru::new(10);
        cache.store("key1", "value1".to_string());

        cache.delete("nonexistent");

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_does_not_invoke_callback() {
        let (cache, evictions) = recording_cache(10);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
        assert!(evictions.lock().is_empty());
    }

    #[test]
    fn test_remove_oldest() {
        let (cache, evictions) = recording_cache(0);

        cache.store("a", "1".to_string());
        cache.store("b", "2".to_string());
        cache.remove_oldest();

        assert_eq!(cache.keys(), vec!["b"]);
        assert_eq!(evicted_keys(&evictions), vec!["a"]);
    }

    #[test]
    fn test_remove_oldest_empty() {
        let (cache, evictions) = recording_cache(0);

        cache.remove_oldest();

        assert!(cache.is_empty());
        assert!(evictions.lock().is_empty());
    }

    #[test]
    fn test_unbounded_when_zero() {
        let (cache, evictions) = recording_cache(0);

        for i in 0..500 {
            cache.store(format!("key{}", i), i.to_string());
        }

        assert_eq!(cache.len(), 500);
        assert!(evictions.lock().is_empty());
    }

    #[test]
    fn test_lowered_capacity_trims_on_next_store() {
        let (cache, evictions) = recording_cache(5);

        for key in ["a", "b", "c", "d", "e"] {
            cache.store(key, key.to_string());
        }
        cache.set_max_entries(2);
        assert_eq!(cache.len(), 5);

        cache.store("f", "f".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["f", "e"]);
        assert_eq!(evicted_keys(&evictions), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_ttl_expiration_on_load() {
        let (cache, evictions) = recording_cache(10);
        cache.set_ttl(Duration::from_millis(50));

        cache.store("a", "1".to_string());
        assert_eq!(cache.load("a"), Some("1".to_string()));

        sleep(Duration::from_millis(60));

        assert_eq!(cache.load("a"), None);
        assert!(cache.is_empty());
        assert_eq!(*evictions.lock(), vec![("a".to_string(), "1".to_string())]);

        // Already gone, no second notification
        assert_eq!(cache.load("a"), None);
        assert_eq!(evictions.lock().len(), 1);
    }

    #[test]
    fn test_ttl_expiration_on_peek() {
        let (cache, evictions) = recording_cache(10);
        cache.set_ttl(Duration::from_millis(50));

        cache.store("a", "1".to_string());
        sleep(Duration::from_millis(60));

        assert_eq!(cache.peek("a"), None);
        assert_eq!(evicted_keys(&evictions), vec!["a"]);
    }

    #[test]
    fn test_ttl_zero_never_expires() {
        let cache = Lru::new(10);

        cache.store("a", "1".to_string());
        sleep(Duration::from_millis(20));

        assert_eq!(cache.load("a"), Some("1".to_string()));
    }

    #[test]
    fn test_update_refreshes_ttl() {
        let (cache, evictions) = recording_cache(10);
        cache.set_ttl(Duration::from_millis(200));

        cache.store("a", "1".to_string());
        sleep(Duration::from_millis(120));
        cache.update("a", "2".to_string());
        sleep(Duration::from_millis(120));

        assert_eq!(cache.peek("a"), Some("2".to_string()));
        assert!(evictions.lock().is_empty());
    }

    #[test]
    fn test_update_expired_key_evicts() {
        let (cache, evictions) = recording_cache(10);
        cache.set_ttl(Duration::from_millis(30));

        cache.store("a", "1".to_string());
        sleep(Duration::from_millis(40));
        cache.update("a", "2".to_string());

        assert!(cache.is_empty());
        assert_eq!(*evictions.lock(), vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_callback_panic_leaves_cache_consistent() {
        let cache = Arc::new(Lru::new(1));
        cache.set_on_evicted(|_key: String, _value: String| panic!("callback failure"));

        cache.store("a", "1".to_string());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.store("b", "2".to_string());
        }));

        assert!(result.is_err());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys(), vec!["b"]);
        assert_eq!(cache.peek("b"), Some("2".to_string()));
    }

    #[test]
    fn test_debug_format() {
        let cache: Lru<u32> = Lru::new(3);
        cache.store("a", 1);

        let debug = format!("{:?}", cache);
        assert!(debug.contains("len: 1"));
        assert!(debug.contains("max_entries: 3"));
    }
}
