pub mod calculator;
pub mod collector;
pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod path_finder;
pub mod router;
pub mod store;
pub mod types;

pub use calculator::PriceCalculator;
pub use collector::MockPoolCollector;
pub use config::{AggregatorConfig, PerformanceConfig, RemoteStoreConfig};
pub use error::{QuoteError, StoreError, SwapError};
pub use graph::{GraphSnapshot, TradingGraph};
pub use path_finder::{PathFinder, PathSearch};
pub use router::Router;
pub use store::{
    CacheStats, KvBackend, MemoryKv, MemoryStore, PoolStore, RemoteStore, StatsProvider,
    TwoTierCache,
};
pub use types::{
    DexKind, Exchange, Pool, PoolRef, QuoteRequest, QuoteResponse, Token, TokenPair, TradePath,
};
