use async_trait::async_trait;
use hk_core::CacheStore;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// Upper bound on stored entries; `None` keeps everything until it expires.
    pub max_entries: Option<usize>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    pub expires_at: Instant,
}

impl<K, V> CacheEntry<K, V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct MemoryStore<K, V> {
    entries: HashMap<K, CacheEntry<K, V>>,
    max_entries: Option<usize>,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries,
        }
    }

    /// Returns a live value. An expired entry is dropped and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&mut self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        if let Some(max) = self.max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                self.make_room(now);
            }
        }
        let entry = CacheEntry {
            key: key.clone(),
            value,
            expires_at: now + ttl,
        };
        self.entries.insert(key, entry);
    }

    fn make_room(&mut self, now: Instant) {
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let max = self.max_entries.unwrap_or(usize::MAX);
        if self.entries.len() < max {
            return;
        }
        // Still full: drop whatever would have expired first.
        if let Some(key) = self
            .entries
            .values()
            .min_by_key(|entry| entry.expires_at)
            .map(|entry| entry.key.clone())
        {
            tracing::debug!("cache full, evicting the entry closest to expiry");
            self.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// In-process TTL cache shared behind an `Arc`.
pub struct MemoryCache<K, V> {
    store: Arc<RwLock<MemoryStore<K, V>>>,
    config: MemoryConfig,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::new())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        let store = Arc::new(RwLock::new(MemoryStore::new(config.max_entries)));
        Self { store, config }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Number of stored entries, expired ones included until they are read.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> CacheStore<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        // Write lock: an expired hit is evicted on the spot.
        let mut store = self.store.write().await;
        store.get(key)
    }

    async fn set(&self, key: K, value: V, ttl: Duration) {
        let mut store = self.store.write().await;
        store.set(key, value, ttl);
    }
}
