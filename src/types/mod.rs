pub mod decimal;
mod pool;
mod quote;
mod token;

pub use pool::{DexKind, Exchange, Pool, PoolRef};
pub use quote::{QuoteRequest, QuoteResponse, TradePath};
pub use token::{Token, TokenPair};
