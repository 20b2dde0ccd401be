use crate::constants::{DAI, USDC, USDT, WETH};
use crate::constants::{EthFactoryAddress, EthRouterAddress};
use crate::error::StoreError;
use crate::store::PoolStore;
use crate::types::{Exchange, Pool, Token};
use alloy_primitives::{Address, U256};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Seeds a store with deterministic mock pools: two exchanges times four
/// major pairs. Drives tests, benches and local development; live pool
/// ingestion is an external collaborator behind the same store contract.
pub struct MockPoolCollector {
    store: Arc<dyn PoolStore>,
    exchanges: Vec<Exchange>,
}

struct MajorPair {
    token0: Token,
    token1: Token,
    reserve0: U256,
    reserve1: U256,
}

fn ether(value: u64) -> U256 {
    U256::from(value) * U256::from(10u64).pow(U256::from(18u64))
}

fn major_pairs() -> Vec<MajorPair> {
    vec![
        MajorPair {
            token0: Token::new(WETH, "WETH", 18),
            token1: Token::new(USDT, "USDT", 6),
            reserve0: ether(1),
            reserve1: U256::from(2_000_000_000u64), // 2000 USDT
        },
        MajorPair {
            token0: Token::new(WETH, "WETH", 18),
            token1: Token::new(USDC, "USDC", 6),
            reserve0: ether(1),
            reserve1: U256::from(2_000_000_000u64), // 2000 USDC
        },
        MajorPair {
            token0: Token::new(WETH, "WETH", 18),
            token1: Token::new(DAI, "DAI", 18),
            reserve0: ether(1),
            reserve1: ether(2_000),
        },
        MajorPair {
            token0: Token::new(USDC, "USDC", 6),
            token1: Token::new(USDT, "USDT", 6),
            reserve0: U256::from(1_000_000_000u64), // 1000 USDC
            reserve1: U256::from(1_000_000_000u64), // 1000 USDT
        },
    ]
}

/// Deterministic mock pool address: one byte tags the exchange, one the
/// pair, so reruns are idempotent.
fn mock_pool_address(exchange_index: usize, pair_index: usize) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xee;
    bytes[18] = exchange_index as u8 + 1;
    bytes[19] = pair_index as u8 + 1;
    Address::new(bytes)
}

impl MockPoolCollector {
    pub fn new(store: Arc<dyn PoolStore>) -> Self {
        let exchanges = vec![
            Exchange {
                name: "Uniswap V2".to_string(),
                factory: EthFactoryAddress::UNISWAP_V2,
                router: EthRouterAddress::UNISWAP_V2,
                version: "v2".to_string(),
            },
            Exchange {
                name: "SushiSwap".to_string(),
                factory: EthFactoryAddress::SUSHISWAP_V2,
                router: EthRouterAddress::SUSHISWAP_V2,
                version: "v2".to_string(),
            },
        ];
        Self { store, exchanges }
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Seed every exchange/pair combination and the token metadata.
    /// Returns the number of pools stored.
    pub async fn init_mock_pools(&self) -> Result<usize, StoreError> {
        let pairs = major_pairs();
        let mut stored = 0usize;

        for (exchange_index, exchange) in self.exchanges.iter().enumerate() {
            for (pair_index, pair) in pairs.iter().enumerate() {
                let pool = Pool {
                    address: mock_pool_address(exchange_index, pair_index),
                    exchange: exchange.name.clone(),
                    version: exchange.version.clone(),
                    token0: pair.token0.clone(),
                    token1: pair.token1.clone(),
                    reserve0: pair.reserve0,
                    reserve1: pair.reserve1,
                    fee: 3,
                    last_updated: Utc::now(),
                };

                match self.store.store_pool(pool).await {
                    Ok(()) => {
                        stored += 1;
                        info!(
                            exchange = %exchange.name,
                            pair = %format!("{}/{}", pair.token0.symbol, pair.token1.symbol),
                            "created mock pool"
                        );
                    }
                    Err(err) => warn!(%err, "failed to store mock pool"),
                }
            }
        }

        for pair in &pairs {
            self.store.store_token(pair.token0.clone()).await?;
            self.store.store_token(pair.token1.clone()).await?;
        }

        let verified = self.store.get_all_pools().await?.len();
        info!(stored, verified, "mock pool seeding complete");
        Ok(stored)
    }
}
