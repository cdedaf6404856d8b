use std::time::Duration;

use async_trait::async_trait;

/// Best-effort key/value cache with per-entry expiry.
///
/// A read after an entry's TTL has lapsed is a miss, exactly as if the key had
/// never been written. Writes always overwrite. Nothing here can fail: a cache
/// that cannot store a value simply forgets it.
#[async_trait]
pub trait CacheStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V>;

    async fn set(&self, key: K, value: V, ttl: Duration);
}
