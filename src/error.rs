use alloy_primitives::Address;

/// Failures of the pool store contract and its implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("pool not found: {0}")]
    PoolNotFound(Address),
    #[error("invalid pool: {0}")]
    InvalidPool(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-candidate outcomes of the price calculator. Inside the search and
/// the router's concurrent evaluation these are counted and the candidate
/// is dropped; callers of the calculator itself see them directly.
#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("token {0} not found in pool")]
    UnknownToken(Address),
    #[error("slippage too high: {impact:.2}% (max: {max:.2}%)")]
    SlippageExceeded { impact: f64, max: f64 },
    #[error("path mismatch: {0}")]
    PathMismatch(String),
    #[error("zero reserve in price-impact computation")]
    ZeroReserve,
    #[error("amount overflow in constant-product math")]
    AmountOverflow,
}

/// Failures surfaced to the caller of a quote.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no valid path found")]
    NoPath,
    #[error("no valid path with positive output found")]
    NoViableQuote,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("trading graph not initialized")]
    GraphUninitialized,
    #[error("quote canceled")]
    Canceled,
    #[error("quote deadline exceeded")]
    DeadlineExceeded,
}
