use super::GraphSnapshot;
use crate::error::{QuoteError, StoreError};
use crate::store::PoolStore;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Owner of the current [`GraphSnapshot`].
///
/// A refresh builds a complete snapshot from the store and publishes it
/// with a single atomic pointer swap; readers observe either the
/// previous or the new snapshot, never a partial one. Searches that
/// loaded the previous snapshot keep it alive until they finish.
pub struct TradingGraph {
    store: Arc<dyn PoolStore>,
    current: ArcSwapOption<GraphSnapshot>,
}

impl TradingGraph {
    pub fn new(store: Arc<dyn PoolStore>) -> Arc<Self> {
        Arc::new(Self { store, current: ArcSwapOption::empty() })
    }

    /// Create the graph and run the initial refresh. The service cannot
    /// answer quotes without a graph, so a failure here is fatal to the
    /// caller.
    pub async fn bootstrap(store: Arc<dyn PoolStore>) -> Result<Arc<Self>, StoreError> {
        let graph = Self::new(store);
        info!("performing initial trading graph load");
        graph.refresh().await?;
        Ok(graph)
    }

    /// Rebuild the snapshot from a full store enumeration and publish it.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let pools = self.store.get_all_pools().await?;
        let snapshot = GraphSnapshot::build(pools);

        info!(
            pools = snapshot.pool_count(),
            tokens = snapshot.token_count(),
            "trading graph refreshed"
        );
        self.current.store(Some(Arc::new(snapshot)));
        Ok(())
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Result<Arc<GraphSnapshot>, QuoteError> {
        self.current.load_full().ok_or(QuoteError::GraphUninitialized)
    }

    /// Spawn the periodic background refresher. Refresh failures are
    /// logged and the previous snapshot stays current; abort the handle
    /// to stop the task.
    pub fn spawn_refresher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let graph = Arc::clone(self);
        info!(?interval, "starting background graph refresher");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately; the
            // bootstrap refresh already covered it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(err) = graph.refresh().await {
                    warn!(%err, "periodic graph refresh failed, keeping previous snapshot");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{USDC, USDT, WETH};
    use crate::store::MemoryStore;
    use crate::types::{Pool, Token};
    use alloy_primitives::{Address, U256};
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
    async fn test_snapshot_before_bootstrap_is_uninitialized() {
        let store = Arc::new(MemoryStore::new());
        let graph = TradingGraph::new(store);

        assert!(matches!(graph.snapshot(), Err(QuoteError::GraphUninitialized)));
    }

    #[tokio::test]
    async fn test_bootstrap_publishes_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store.store_pool(pool(Address::repeat_byte(0x01), WETH, USDT)).await.unwrap();

        let graph = TradingGraph::bootstrap(store).await.unwrap();
        let snapshot = graph.snapshot().unwrap();
        assert_eq!(snapshot.pool_count(), 1);
        assert!(snapshot.contains_token(WETH));
    }

    #[tokio::test]
    async fn test_refresh_is_structurally_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.store_pool(pool(Address::repeat_byte(0x01), WETH, USDT)).await.unwrap();
        store.store_pool(pool(Address::repeat_byte(0x02), WETH, USDC)).await.unwrap();

        let graph = TradingGraph::bootstrap(Arc::clone(&store) as Arc<dyn PoolStore>)
            .await
            .unwrap();
        let first = graph.snapshot().unwrap();
        graph.refresh().await.unwrap();
        let second = graph.snapshot().unwrap();

        assert_eq!(first.token_count(), second.token_count());
        assert_eq!(first.pool_count(), second.pool_count());

        let summarize = |snapshot: &GraphSnapshot| {
            let mut edges: Vec<(Address, Address, Vec<Address>, U256)> = snapshot
                .edges()
                .map(|(a, b, weight)| {
                    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                    let mut pools: Vec<Address> =
                        weight.pools.iter().map(|p| p.address).collect();
                    pools.sort();
                    (lo, hi, pools, weight.liquidity)
                })
                .collect();
            edges.sort();
            edges
        };
        assert_eq!(summarize(&first), summarize(&second));
    }

    #[tokio::test]
    async fn test_background_refresher_picks_up_store_changes() {
        let store = Arc::new(MemoryStore::new());
        store.store_pool(pool(Address::repeat_byte(0x01), WETH, USDT)).await.unwrap();

        let graph = TradingGraph::bootstrap(Arc::clone(&store) as Arc<dyn PoolStore>)
            .await
            .unwrap();
        let refresher = graph.spawn_refresher(Duration::from_millis(20));

        store.store_pool(pool(Address::repeat_byte(0x02), WETH, USDC)).await.unwrap();

        let mut refreshed = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if graph.snapshot().unwrap().contains_token(USDC) {
                refreshed = true;
                break;
            }
        }
        refresher.abort();
        assert!(refreshed, "background refresher should publish the new pool");
    }

    #[tokio::test]
    async fn test_old_snapshot_survives_refresh() {
        let store = Arc::new(MemoryStore::new());
        store.store_pool(pool(Address::repeat_byte(0x01), WETH, USDT)).await.unwrap();

        let graph = TradingGraph::bootstrap(Arc::clone(&store) as Arc<dyn PoolStore>)
            .await
            .unwrap();
        let held = graph.snapshot().unwrap();

        store.store_pool(pool(Address::repeat_byte(0x02), WETH, USDC)).await.unwrap();
        graph.refresh().await.unwrap();

        // The pre-refresh view is unchanged for whoever holds it.
        assert_eq!(held.pool_count(), 1);
        assert!(!held.contains_token(USDC));

        let fresh = graph.snapshot().unwrap();
        assert_eq!(fresh.pool_count(), 2);
        assert!(fresh.contains_token(USDC));
    }
}
