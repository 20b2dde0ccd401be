mod kv;
mod memory;
mod remote;
mod two_tier;

pub use kv::{KvBackend, MemoryKv};
pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use two_tier::{CacheStats, StatsProvider, TwoTierCache};

use crate::error::StoreError;
use crate::types::{Pool, PoolRef, Token};
use alloy_primitives::Address;
use async_trait::async_trait;

/// The pool store contract. Implemented by the in-memory store, the
/// remote store and the two-tier composition; callers depend only on
/// this trait. Statistics retrieval is a separate optional capability
/// ([`StatsProvider`]), never a downcast.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Store a pool record keyed by its address and maintain the
    /// symmetric token-pair index. Rejects pools whose two tokens are
    /// the same address.
    async fn store_pool(&self, pool: Pool) -> Result<(), StoreError>;

    async fn get_pool(&self, address: Address) -> Result<PoolRef, StoreError>;

    /// All pools on the unordered edge `{token_a, token_b}`.
    async fn get_pools_by_tokens(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Vec<PoolRef>, StoreError>;

    /// Enumeration for graph builds.
    async fn get_all_pools(&self) -> Result<Vec<PoolRef>, StoreError>;

    async fn store_token(&self, token: Token) -> Result<(), StoreError>;

    /// Token metadata. Absence resolves to the `{address, "UNKNOWN", 18}`
    /// fallback on every implementation.
    async fn get_token(&self, address: Address) -> Result<Token, StoreError>;
}
