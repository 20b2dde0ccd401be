use super::PoolStore;
use crate::error::StoreError;
use crate::types::{Pool, PoolRef, Token, TokenPair};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const DEFAULT_LOCAL_TTL: Duration = Duration::from_secs(300);

/// A stored record together with its insertion time.
#[derive(Clone, Debug)]
struct CacheItem<T> {
    data: T,
    stored_at: Instant,
}

impl<T> CacheItem<T> {
    fn new(data: T) -> Self {
        Self { data, stored_at: Instant::now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() > ttl
    }
}

#[derive(Default)]
struct Inner {
    pools: HashMap<Address, CacheItem<PoolRef>>,
    // unordered token pair -> pool addresses on that edge
    pairs: HashMap<TokenPair, Vec<Address>>,
    tokens: HashMap<Address, Token>,
}

/// In-memory pool store guarded by a readers-writer lock. Entries expire
/// after `ttl`; expired entries read as misses so the two-tier cache
/// falls through to the remote store.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    ttl: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_LOCAL_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { inner: RwLock::new(Inner::default()), ttl }
    }

    /// Drop every expired pool entry. Pair-index entries pointing at
    /// dropped pools are resolved lazily on read.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.pools.retain(|_, item| !item.is_expired(ttl));
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.pools.values().filter(|item| !item.is_expired(self.ttl)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored token metadata, or `None` when this tier has never seen
    /// the address. The trait surface resolves absence to the UNKNOWN
    /// fallback; the two-tier cache reads this instead so a local miss
    /// falls through to the remote tier.
    pub fn lookup_token(&self, address: Address) -> Option<Token> {
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.tokens.get(&address).cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn store_pool(&self, pool: Pool) -> Result<(), StoreError> {
        pool.validate()?;

        let address = pool.address;
        let pair = pool.pair();
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.pools.insert(address, CacheItem::new(PoolRef::new(pool)));

        let indexed = inner.pairs.entry(pair).or_default();
        if !indexed.contains(&address) {
            indexed.push(address);
        }
        Ok(())
    }

    async fn get_pool(&self, address: Address) -> Result<PoolRef, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match inner.pools.get(&address) {
            Some(item) if !item.is_expired(self.ttl) => Ok(item.data.clone()),
            _ => Err(StoreError::PoolNotFound(address)),
        }
    }

    async fn get_pools_by_tokens(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Vec<PoolRef>, StoreError> {
        let pair = TokenPair::new(token_a, token_b);
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut pools = Vec::new();
        if let Some(addresses) = inner.pairs.get(&pair) {
            for address in addresses {
                if let Some(item) = inner.pools.get(address) {
                    if !item.is_expired(self.ttl) {
                        pools.push(item.data.clone());
                    }
                }
            }
        }
        Ok(pools)
    }

    async fn get_all_pools(&self) -> Result<Vec<PoolRef>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner
            .pools
            .values()
            .filter(|item| !item.is_expired(self.ttl))
            .map(|item| item.data.clone())
            .collect())
    }

    async fn store_token(&self, token: Token) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.tokens.insert(token.address, token);
        Ok(())
    }

    async fn get_token(&self, address: Address) -> Result<Token, StoreError> {
        Ok(self.lookup_token(address).unwrap_or_else(|| Token::unknown(address)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DAI, USDT, WETH};
    use alloy_primitives::U256;
    use chrono::Utc;

    fn pool(address: Address, t0: Address, t1: Address) -> Pool {
        Pool {
            address,
            exchange: "Uniswap V2".to_string(),
            version: "v2".to_string(),
            token0: Token::new(t0, "T0", 18),
            token1: Token::new(t1, "T1", 18),
            reserve0: U256::from(1_000u64),
            reserve1: U256::from(2_000u64),
            fee: 3,
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_and_get_pool() {
        let store = MemoryStore::new();
        let address = Address::repeat_byte(0x01);
        store.store_pool(pool(address, WETH, USDT)).await.unwrap();

        let found = store.get_pool(address).await.unwrap();
        assert_eq!(found.address, address);

        let missing = store.get_pool(Address::repeat_byte(0x99)).await;
        assert!(matches!(missing, Err(StoreError::PoolNotFound(_))));
    }

    #[tokio::test]
    async fn test_pair_index_is_symmetric() {
        let store = MemoryStore::new();
        store.store_pool(pool(Address::repeat_byte(0x01), WETH, USDT)).await.unwrap();
        store.store_pool(pool(Address::repeat_byte(0x02), WETH, USDT)).await.unwrap();

        let forward = store.get_pools_by_tokens(WETH, USDT).await.unwrap();
        let backward = store.get_pools_by_tokens(USDT, WETH).await.unwrap();
        assert_eq!(forward.len(), 2);
        assert_eq!(forward, backward);

        let other = store.get_pools_by_tokens(WETH, DAI).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_replacing_pool_does_not_duplicate_index() {
        let store = MemoryStore::new();
        let address = Address::repeat_byte(0x01);
        store.store_pool(pool(address, WETH, USDT)).await.unwrap();
        store.store_pool(pool(address, WETH, USDT)).await.unwrap();

        let pools = store.get_pools_by_tokens(WETH, USDT).await.unwrap();
        assert_eq!(pools.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_identical_tokens() {
        let store = MemoryStore::new();
        let result = store.store_pool(pool(Address::repeat_byte(0x01), WETH, WETH)).await;
        assert!(matches!(result, Err(StoreError::InvalidPool(_))));
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_misses() {
        let store = MemoryStore::with_ttl(Duration::from_millis(0));
        let address = Address::repeat_byte(0x01);
        store.store_pool(pool(address, WETH, USDT)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(store.get_pool(address).await.is_err());
        assert!(store.get_all_pools().await.unwrap().is_empty());
        assert!(store.get_pools_by_tokens(WETH, USDT).await.unwrap().is_empty());

        store.purge_expired();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_token_round_trip_with_unknown_fallback() {
        let store = MemoryStore::new();

        let fallback = store.get_token(WETH).await.unwrap();
        assert_eq!(fallback.address, WETH);
        assert_eq!(fallback.symbol, "UNKNOWN");
        assert_eq!(fallback.decimals, 18);
        assert!(store.lookup_token(WETH).is_none());

        store.store_token(Token::new(WETH, "WETH", 18)).await.unwrap();
        assert_eq!(store.get_token(WETH).await.unwrap().symbol, "WETH");
        assert_eq!(store.lookup_token(WETH).unwrap().symbol, "WETH");
    }
}
