use super::{KvBackend, MemoryStore, PoolStore, RemoteStore};
use crate::error::StoreError;
use crate::types::{Pool, PoolRef, Token};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Cache hit/miss counters. Monotonically increasing; mutated under a
/// short-lived mutex.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub local_hits: u64,
    pub local_misses: u64,
    pub remote_hits: u64,
    pub remote_misses: u64,
}

/// Optional capability for store compositions that track statistics.
/// Kept separate from [`PoolStore`] so callers never downcast.
pub trait StatsProvider {
    fn stats(&self) -> CacheStats;
}

/// Two-tier composition of a local in-memory store and a remote store.
///
/// Writes go to both tiers; a local write failure is logged and
/// non-fatal, a remote write failure fails the write. Point reads
/// consult the local tier first and backfill it asynchronously after a
/// remote hit. Enumerations (`get_all_pools`, `get_pools_by_tokens`) are
/// served by the remote tier, the source of truth.
pub struct TwoTierCache<B> {
    local: Arc<MemoryStore>,
    remote: RemoteStore<B>,
    stats: Mutex<CacheStats>,
}

impl<B: KvBackend + 'static> TwoTierCache<B> {
    pub fn new(local: MemoryStore, remote: RemoteStore<B>) -> Self {
        Self { local: Arc::new(local), remote, stats: Mutex::new(CacheStats::default()) }
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        update(&mut stats);
    }

    /// Backfill the local tier after a remote hit. Detached from the
    /// requesting task so request cancellation never loses the write.
    fn backfill_local(&self, pool: PoolRef) {
        let local = Arc::clone(&self.local);
        tokio::spawn(async move {
            if let Err(err) = local.store_pool((*pool).clone()).await {
                warn!(%err, pool = %pool.address, "failed to backfill local cache");
            }
        });
    }

    fn warm_local(&self, pools: Vec<PoolRef>) {
        let local = Arc::clone(&self.local);
        tokio::spawn(async move {
            for pool in pools {
                if let Err(err) = local.store_pool((*pool).clone()).await {
                    warn!(%err, pool = %pool.address, "failed to warm local cache");
                }
            }
        });
    }
}

impl<B> StatsProvider for TwoTierCache<B> {
    fn stats(&self) -> CacheStats {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl<B: KvBackend + 'static> PoolStore for TwoTierCache<B> {
    async fn store_pool(&self, pool: Pool) -> Result<(), StoreError> {
        if let Err(err) = self.local.store_pool(pool.clone()).await {
            warn!(%err, pool = %pool.address, "failed to store pool in local cache");
        }
        self.remote.store_pool(pool).await
    }

    async fn get_pool(&self, address: Address) -> Result<PoolRef, StoreError> {
        if let Ok(pool) = self.local.get_pool(address).await {
            self.record(|stats| stats.local_hits += 1);
            return Ok(pool);
        }
        self.record(|stats| stats.local_misses += 1);

        match self.remote.get_pool(address).await {
            Ok(pool) => {
                self.record(|stats| stats.remote_hits += 1);
                self.backfill_local(pool.clone());
                Ok(pool)
            }
            Err(err) => {
                self.record(|stats| stats.remote_misses += 1);
                Err(err)
            }
        }
    }

    async fn get_pools_by_tokens(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Vec<PoolRef>, StoreError> {
        // The remote pair index is authoritative; the local tier only
        // sees what has been backfilled.
        self.remote.get_pools_by_tokens(token_a, token_b).await
    }

    async fn get_all_pools(&self) -> Result<Vec<PoolRef>, StoreError> {
        let pools = self.remote.get_all_pools().await?;
        debug!(pools = pools.len(), "warming local cache from full enumeration");
        self.warm_local(pools.clone());
        Ok(pools)
    }

    async fn store_token(&self, token: Token) -> Result<(), StoreError> {
        if let Err(err) = self.local.store_token(token.clone()).await {
            warn!(%err, token = %token.address, "failed to store token in local cache");
        }
        self.remote.store_token(token).await
    }

    async fn get_token(&self, address: Address) -> Result<Token, StoreError> {
        // Raw lookup, not the trait surface: the local tier's UNKNOWN
        // fallback would otherwise mask tokens only the remote knows.
        if let Some(token) = self.local.lookup_token(address) {
            return Ok(token);
        }
        self.remote.get_token(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{USDT, WETH};
    use crate::store::MemoryKv;
    use alloy_primitives::U256;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;

    struct FailingKv;

    #[async_trait]
    impl KvBackend for FailingKv {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("backend down".to_string()))
        }

        async fn put(
            &self,
            _key: &str,
            _value: String,
            _ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("backend down".to_string()))
        }

        async fn sadd(
            &self,
            _key: &str,
            _member: &str,
            _ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("backend down".to_string()))
        }

        async fn smembers(&self, _key: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("backend down".to_string()))
        }
    }

    fn pool(address: Address) -> Pool {
        Pool {
            address,
            exchange: "Uniswap V2".to_string(),
            version: "v2".to_string(),
            token0: Token::new(WETH, "WETH", 18),
            token1: Token::new(USDT, "USDT", 6),
            reserve0: U256::from(1_000u64),
            reserve1: U256::from(2_000u64),
            fee: 3,
            last_updated: Utc::now(),
        }
    }

    fn memory_backed() -> TwoTierCache<MemoryKv> {
        TwoTierCache::new(MemoryStore::new(), RemoteStore::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn test_write_through_and_local_hit() {
        let cache = memory_backed();
        let address = Address::repeat_byte(0x01);
        cache.store_pool(pool(address)).await.unwrap();

        let found = cache.get_pool(address).await.unwrap();
        assert_eq!(found.address, address);

        let stats = cache.stats();
        assert_eq!(stats.local_hits, 1);
        assert_eq!(stats.local_misses, 0);
        assert_eq!(stats.remote_hits, 0);
    }

    #[tokio::test]
    async fn test_remote_hit_backfills_local() {
        let cache = memory_backed();
        let address = Address::repeat_byte(0x02);

        // Populate the remote tier only.
        cache.remote.store_pool(pool(address)).await.unwrap();

        let found = cache.get_pool(address).await.unwrap();
        assert_eq!(found.address, address);

        let stats = cache.stats();
        assert_eq!(stats.local_misses, 1);
        assert_eq!(stats.remote_hits, 1);

        // The detached backfill lands shortly after the read returns.
        let mut backfilled = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            if cache.local.get_pool(address).await.is_ok() {
                backfilled = true;
                break;
            }
        }
        assert!(backfilled, "remote hit should backfill the local tier");

        cache.get_pool(address).await.unwrap();
        assert_eq!(cache.stats().local_hits, 1);
    }

    #[tokio::test]
    async fn test_double_miss_counts_and_surfaces_not_found() {
        let cache = memory_backed();
        let result = cache.get_pool(Address::repeat_byte(0x0f)).await;
        assert!(matches!(result, Err(StoreError::PoolNotFound(_))));

        let stats = cache.stats();
        assert_eq!(stats.local_misses, 1);
        assert_eq!(stats.remote_misses, 1);
    }

    #[tokio::test]
    async fn test_remote_write_failure_is_fatal() {
        let cache = TwoTierCache::new(MemoryStore::new(), RemoteStore::new(FailingKv));
        let result = cache.store_pool(pool(Address::repeat_byte(0x01))).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_remote_read_failure_is_surfaced() {
        let cache = TwoTierCache::new(MemoryStore::new(), RemoteStore::new(FailingKv));
        let result = cache.get_pool(Address::repeat_byte(0x01)).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let all = cache.get_all_pools().await;
        assert!(matches!(all, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_enumerations_come_from_remote() {
        let cache = memory_backed();
        cache.store_pool(pool(Address::repeat_byte(0x01))).await.unwrap();
        cache.store_pool(pool(Address::repeat_byte(0x02))).await.unwrap();

        assert_eq!(cache.get_all_pools().await.unwrap().len(), 2);
        assert_eq!(cache.get_pools_by_tokens(USDT, WETH).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_token_falls_through_to_remote_unknown() {
        let cache = memory_backed();
        let token = cache.get_token(Address::repeat_byte(0x30)).await.unwrap();
        assert_eq!(token.symbol, "UNKNOWN");

        cache.store_token(Token::new(WETH, "WETH", 18)).await.unwrap();
        assert_eq!(cache.get_token(WETH).await.unwrap().symbol, "WETH");
    }

    #[tokio::test]
    async fn test_token_known_only_remotely_is_not_masked() {
        let cache = memory_backed();
        // The local tier's own UNKNOWN fallback must not shadow a token
        // the remote tier has metadata for.
        cache.remote.store_token(Token::new(USDT, "USDT", 6)).await.unwrap();

        let token = cache.get_token(USDT).await.unwrap();
        assert_eq!(token.symbol, "USDT");
        assert_eq!(token.decimals, 6);
    }
}
