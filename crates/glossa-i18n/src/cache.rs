//! LRU cache of resolved translations.
//!
//! Entries are keyed by locale, key ordinal and content kind. The cache holds
//! one [`lru::LruCache`] behind a mutex; counters live outside the lock.
//!
//! Every [`TranslationCache::clear`] advances a generation number. The
//! service tags its reads and inserts with the generation it observed when
//! its snapshot was published, so content resolved against an old snapshot
//! is dropped instead of being written back after a swap.

use crate::content::{Content, ContentKind};
use crate::error::{I18nError, I18nResult};
use crate::key::TranslationKey;
use crate::locale::LocaleSource;
use glossa_config::{
    CacheConfig, CacheSizeMode, DEFAULT_CACHE_SIZE, MAX_AUTOMATIC_CACHE_SIZE,
    MIN_AUTOMATIC_CACHE_SIZE,
};
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sysinfo::System;
use tracing::{debug, trace};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CACHE_SIZE) {
    Some(capacity) => capacity,
    None => panic!("DEFAULT_CACHE_SIZE must be non-zero"),
};

/// Identity of one cached translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    locale: Arc<str>,
    ordinal: u32,
    kind: ContentKind,
}

impl CacheKey {
    /// Builds the key for `key` in `locale`.
    pub fn new(locale: &LocaleSource, key: &TranslationKey, kind: ContentKind) -> Self {
        Self {
            locale: locale.localization_handle(),
            ordinal: key.ordinal(),
            kind,
        }
    }

    /// Normalized locale tag.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Ordinal of the translation key.
    pub const fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Kind of the cached content.
    pub const fn kind(&self) -> ContentKind {
        self.kind
    }
}

#[derive(Debug, Default)]
struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

struct CacheState {
    entries: LruCache<CacheKey, Content>,
    generation: u64,
}

/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStatistics {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

impl CacheStatistics {
    /// Hit percentage in `[0, 100]`, or zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / total as f64
        }
    }
}

impl fmt::Display for CacheStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits + self.misses == 0 {
            write!(
                f,
                "Cache: 0 hits, 0 misses, size: {}/{}",
                self.size, self.capacity
            )
        } else {
            write!(
                f,
                "Cache: {} hits, {} misses, hit rate: {:.2}%, size: {}/{}",
                self.hits,
                self.misses,
                self.hit_rate(),
                self.size,
                self.capacity
            )
        }
    }
}

/// Bounded, thread-safe LRU cache of [`Content`].
pub struct TranslationCache {
    state: Mutex<CacheState>,
    metrics: CacheMetrics,
}

impl TranslationCache {
    /// Creates a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> I18nResult<Self> {
        Ok(Self::with_capacity(non_zero(capacity)?))
    }

    /// Creates a cache whose capacity needs no validation.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
            metrics: CacheMetrics::default(),
        }
    }

    /// Creates a cache sized according to `config`.
    pub fn from_config(config: &CacheConfig) -> I18nResult<Self> {
        Self::new(capacity_for(config)?)
    }

    /// Returns the entry for `key`, marking it most recently used.
    pub fn get(&self, key: &CacheKey) -> Option<Content> {
        let found = self.state.lock().entries.get(key).cloned();
        self.record_lookup(key, found.is_some());
        found
    }

    /// Like [`TranslationCache::get`], but misses if the cache has been
    /// cleared since `generation`.
    pub(crate) fn get_if_generation(&self, key: &CacheKey, generation: u64) -> Option<Content> {
        let found = {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.entries.get(key).cloned()
            } else {
                None
            }
        };
        self.record_lookup(key, found.is_some());
        found
    }

    fn record_lookup(&self, key: &CacheKey, hit: bool) {
        if hit {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            trace!(locale = key.locale(), ordinal = key.ordinal, kind = %key.kind, "Cache hit");
        } else {
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            trace!(locale = key.locale(), ordinal = key.ordinal, kind = %key.kind, "Cache miss");
        }
    }

    /// Inserts or overwrites `key`, evicting the least recently used entry
    /// when full.
    pub fn put(&self, key: CacheKey, content: Content) {
        let evicted = {
            let mut state = self.state.lock();
            insert(&mut state.entries, key, content)
        };
        self.record_eviction(evicted);
    }

    /// Inserts only if the cache is still at `generation`. Returns whether the
    /// entry was stored.
    pub(crate) fn put_if_generation(&self, key: CacheKey, content: Content, generation: u64) -> bool {
        let evicted = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return false;
            }
            insert(&mut state.entries, key, content)
        };
        self.record_eviction(evicted);
        true
    }

    fn record_eviction(&self, evicted: Option<CacheKey>) {
        if let Some(evicted) = evicted {
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(
                locale = evicted.locale(),
                ordinal = evicted.ordinal,
                kind = %evicted.kind,
                "Evicted least recently used translation"
            );
        }
    }

    /// Changes the capacity; shrinking evicts least recently used entries
    /// right away.
    pub fn set_capacity(&self, capacity: usize) -> I18nResult<()> {
        let capacity = non_zero(capacity)?;
        let evicted = {
            let mut state = self.state.lock();
            let before = state.entries.len();
            state.entries.resize(capacity);
            before - state.entries.len()
        };

        if evicted > 0 {
            self.metrics
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, capacity = capacity.get(), "Shrunk translation cache");
        }
        Ok(())
    }

    /// Drops every entry, resets the counters and starts a new generation,
    /// which is returned.
    pub fn clear(&self) -> u64 {
        let generation = {
            let mut state = self.state.lock();
            state.entries.clear();
            state.generation += 1;
            state.generation
        };
        self.metrics.reset();
        debug!(generation, "Cleared translation cache");
        generation
    }

    /// Current generation; advanced by every [`TranslationCache::clear`].
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.state.lock().entries.cap().get()
    }

    /// Lookups that found an entry since the last clear.
    pub fn hit_count(&self) -> u64 {
        self.metrics.hits.load(Ordering::Relaxed)
    }

    /// Lookups that found nothing since the last clear.
    pub fn miss_count(&self) -> u64 {
        self.metrics.misses.load(Ordering::Relaxed)
    }

    /// Entries evicted since the last clear.
    pub fn eviction_count(&self) -> u64 {
        self.metrics.evictions.load(Ordering::Relaxed)
    }

    /// Hit percentage in `[0, 100]`, or zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        self.statistics().hit_rate()
    }

    /// Snapshot of all counters.
    pub fn statistics(&self) -> CacheStatistics {
        let (size, capacity) = {
            let state = self.state.lock();
            (state.entries.len(), state.entries.cap().get())
        };
        CacheStatistics {
            hits: self.hit_count(),
            misses: self.miss_count(),
            evictions: self.eviction_count(),
            size,
            capacity,
        }
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationCache")
            .field("statistics", &self.statistics())
            .finish_non_exhaustive()
    }
}

/// Puts `key` and reports the entry pushed out to make room, if any.
fn insert(
    entries: &mut LruCache<CacheKey, Content>,
    key: CacheKey,
    content: Content,
) -> Option<CacheKey> {
    match entries.push(key, content) {
        Some((old_key, _)) if !entries.contains(&old_key) => Some(old_key),
        _ => None,
    }
}

fn non_zero(capacity: usize) -> I18nResult<NonZeroUsize> {
    NonZeroUsize::new(capacity).ok_or(I18nError::InvalidCacheSize { size: capacity })
}

/// Capacity for a machine with `available_bytes` of free memory: one entry
/// per KiB of a tenth of it, clamped to the automatic range.
pub const fn capacity_for_memory(available_bytes: u64) -> usize {
    let kib = available_bytes / 10 / 1024;
    let capped = if kib > MAX_AUTOMATIC_CACHE_SIZE as u64 {
        MAX_AUTOMATIC_CACHE_SIZE
    } else {
        kib as usize
    };
    if capped < MIN_AUTOMATIC_CACHE_SIZE {
        MIN_AUTOMATIC_CACHE_SIZE
    } else {
        capped
    }
}

/// Capacity derived from the memory currently available on this machine.
pub fn automatic_capacity() -> usize {
    let mut system = System::new();
    system.refresh_memory();
    let available = system.available_memory();
    let capacity = capacity_for_memory(available);
    debug!(available_bytes = available, capacity, "Sized translation cache from system memory");
    capacity
}

/// Resolves the capacity `config` asks for.
pub fn capacity_for(config: &CacheConfig) -> I18nResult<usize> {
    match config.mode {
        CacheSizeMode::Manual if config.manual_size == 0 => Err(I18nError::InvalidCacheSize {
            size: config.manual_size,
        }),
        CacheSizeMode::Manual => Ok(config.manual_size),
        CacheSizeMode::Automatic => Ok(automatic_capacity()),
        CacheSizeMode::Default => Ok(DEFAULT_CACHE_SIZE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Text;
    use crate::key::KeyRegistry;
    use glossa_common::test_utils::assert_approx_eq;

    struct Fixture {
        registry: KeyRegistry,
        locale: LocaleSource,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: KeyRegistry::new(),
                locale: LocaleSource::new("en_US").unwrap(),
            }
        }

        fn key(&self, name: &str) -> CacheKey {
            let key = self.registry.intern_or_create(name).unwrap();
            CacheKey::new(&self.locale, &key, ContentKind::Text)
        }
    }

    fn text(value: &str) -> Content {
        Content::Text(Text::from(value))
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            TranslationCache::new(0),
            Err(I18nError::InvalidCacheSize { size: 0 })
        ));
        let cache = TranslationCache::new(1).unwrap();
        assert!(cache.set_capacity(0).is_err());
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let fixture = Fixture::new();
        let cache = TranslationCache::new(4).unwrap();
        let key = fixture.key("a");

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), text("A"));
        assert_eq!(cache.get(&key), Some(text("A")));

        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 1);
        assert_approx_eq(cache.hit_rate(), 50.0, 1e-9);
    }

    #[test]
    fn test_keys_differ_by_kind_and_locale() {
        let fixture = Fixture::new();
        let key = fixture.registry.intern_or_create("shared").unwrap();
        let text_key = CacheKey::new(&fixture.locale, &key, ContentKind::Text);
        let message_key = CacheKey::new(&fixture.locale, &key, ContentKind::Message);
        let other_locale = CacheKey::new(&LocaleSource::new("de_DE").unwrap(), &key, ContentKind::Text);

        assert_ne!(text_key, message_key);
        assert_ne!(text_key, other_locale);
        assert_eq!(text_key, CacheKey::new(&LocaleSource::new("EN-us").unwrap(), &key, ContentKind::Text));
    }

    #[test]
    fn test_eviction_counts_only_real_evictions() {
        let fixture = Fixture::new();
        let cache = TranslationCache::new(2).unwrap();
        cache.put(fixture.key("a"), text("1"));
        cache.put(fixture.key("a"), text("2"));
        assert_eq!(cache.eviction_count(), 0);

        cache.put(fixture.key("b"), text("3"));
        cache.put(fixture.key("c"), text("4"));
        assert_eq!(cache.eviction_count(), 1);
        assert!(cache.get(&fixture.key("a")).is_none());
    }

    #[test]
    fn test_generation_guards() {
        let fixture = Fixture::new();
        let cache = TranslationCache::new(4).unwrap();
        let stale = cache.generation();
        let current = cache.clear();
        assert_eq!(current, stale + 1);

        assert!(!cache.put_if_generation(fixture.key("a"), text("old"), stale));
        assert!(cache.is_empty());

        assert!(cache.put_if_generation(fixture.key("a"), text("new"), current));
        assert!(cache.get_if_generation(&fixture.key("a"), stale).is_none());
        assert_eq!(cache.get_if_generation(&fixture.key("a"), current), Some(text("new")));
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 1);
    }

    #[test]
    fn test_statistics_display() {
        let fixture = Fixture::new();
        let cache = TranslationCache::new(10).unwrap();
        assert_eq!(cache.statistics().to_string(), "Cache: 0 hits, 0 misses, size: 0/10");

        cache.put(fixture.key("a"), text("A"));
        cache.get(&fixture.key("a"));
        cache.get(&fixture.key("b"));
        cache.get(&fixture.key("a"));
        assert_eq!(
            cache.statistics().to_string(),
            "Cache: 2 hits, 1 misses, hit rate: 66.67%, size: 1/10"
        );
        assert_approx_eq(cache.statistics().hit_rate(), 200.0 / 3.0, 1e-9);
    }

    #[test]
    fn test_capacity_for_memory_clamps() {
        assert_eq!(capacity_for_memory(0), MIN_AUTOMATIC_CACHE_SIZE);
        assert_eq!(capacity_for_memory(10 * 1024 * 5_000), 5_000);
        assert_eq!(capacity_for_memory(u64::MAX), MAX_AUTOMATIC_CACHE_SIZE);
    }

    #[test]
    fn test_capacity_for_config() {
        assert_eq!(capacity_for(&CacheConfig::default()).unwrap(), DEFAULT_CACHE_SIZE);
        assert_eq!(capacity_for(&CacheConfig::manual(42)).unwrap(), 42);
        assert!(capacity_for(&CacheConfig::manual(0)).is_err());

        let automatic = capacity_for(&CacheConfig::automatic()).unwrap();
        assert!((MIN_AUTOMATIC_CACHE_SIZE..=MAX_AUTOMATIC_CACHE_SIZE).contains(&automatic));
    }
}
