use super::{KvBackend, PoolStore};
use crate::error::StoreError;
use crate::types::{Pool, PoolRef, Token, TokenPair};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

const DEFAULT_KEY_PREFIX: &str = "dex:";
const DEFAULT_ENTRY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Pool store persisting records into a key-value backing store under a
/// textual key layout:
///
/// - `{prefix}pool:{address}` JSON pool, 24 h TTL
/// - `{prefix}token_pair:{a}:{b}` set of pool addresses, 24 h TTL,
///   written in canonical pair order, probed in both orders on read
/// - `{prefix}all_pools` set of all pool addresses, no TTL
/// - `{prefix}token:{address}` JSON token, 24 h TTL
pub struct RemoteStore<B> {
    backend: B,
    prefix: String,
    entry_ttl: Duration,
}

impl<B: KvBackend> RemoteStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_prefix(backend, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(backend: B, prefix: impl Into<String>) -> Self {
        Self { backend, prefix: prefix.into(), entry_ttl: DEFAULT_ENTRY_TTL }
    }

    pub fn from_config(backend: B, config: &crate::config::RemoteStoreConfig) -> Self {
        Self::with_prefix(backend, config.key_prefix.clone())
    }

    fn pool_key(&self, address: Address) -> String {
        format!("{}pool:{:#x}", self.prefix, address)
    }

    fn token_key(&self, address: Address) -> String {
        format!("{}token:{:#x}", self.prefix, address)
    }

    fn pair_key(&self, a: Address, b: Address) -> String {
        format!("{}token_pair:{:#x}:{:#x}", self.prefix, a, b)
    }

    fn all_pools_key(&self) -> String {
        format!("{}all_pools", self.prefix)
    }

    async fn fetch_pool(&self, address: Address) -> Result<Option<PoolRef>, StoreError> {
        match self.backend.get(&self.pool_key(address)).await? {
            Some(raw) => {
                let pool: Pool = serde_json::from_str(&raw)?;
                Ok(Some(PoolRef::new(pool)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<B: KvBackend> PoolStore for RemoteStore<B> {
    async fn store_pool(&self, pool: Pool) -> Result<(), StoreError> {
        pool.validate()?;

        let address = pool.address;
        let pair = pool.pair();
        let encoded = serde_json::to_string(&pool)?;

        self.backend.put(&self.pool_key(address), encoded, Some(self.entry_ttl)).await?;

        let member = format!("{address:#x}");
        self.backend
            .sadd(&self.pair_key(pair.lo(), pair.hi()), &member, Some(self.entry_ttl))
            .await?;
        self.backend.sadd(&self.all_pools_key(), &member, None).await?;
        Ok(())
    }

    async fn get_pool(&self, address: Address) -> Result<PoolRef, StoreError> {
        self.fetch_pool(address).await?.ok_or(StoreError::PoolNotFound(address))
    }

    async fn get_pools_by_tokens(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Vec<PoolRef>, StoreError> {
        let pair = TokenPair::new(token_a, token_b);

        // Probe both key orderings; writers may predate canonical order.
        let mut members = self.backend.smembers(&self.pair_key(pair.lo(), pair.hi())).await?;
        members.extend(self.backend.smembers(&self.pair_key(pair.hi(), pair.lo())).await?);
        members.sort();
        members.dedup();

        let mut pools = Vec::with_capacity(members.len());
        for member in members {
            let Ok(address) = member.parse::<Address>() else {
                warn!(member = %member, "skipping malformed pool address in pair index");
                continue;
            };
            // Entries whose pool record expired are skipped, not fatal.
            if let Some(pool) = self.fetch_pool(address).await? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }

    async fn get_all_pools(&self) -> Result<Vec<PoolRef>, StoreError> {
        let members = self.backend.smembers(&self.all_pools_key()).await?;

        let mut pools = Vec::with_capacity(members.len());
        for member in members {
            let Ok(address) = member.parse::<Address>() else {
                warn!(member = %member, "skipping malformed pool address in all-pools set");
                continue;
            };
            if let Some(pool) = self.fetch_pool(address).await? {
                pools.push(pool);
            }
        }
        Ok(pools)
    }

    async fn store_token(&self, token: Token) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&token)?;
        self.backend.put(&self.token_key(token.address), encoded, Some(self.entry_ttl)).await
    }

    async fn get_token(&self, address: Address) -> Result<Token, StoreError> {
        match self.backend.get(&self.token_key(address)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Token::unknown(address)),
        }
    }
}
