use super::PoolRef;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Request for a price quote. `amount_in` travels as a decimal string on
/// the wire; `max_hops` is optional and defaults at the router.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub token_in: Address,
    pub token_out: Address,
    #[serde(default, with = "crate::types::decimal")]
    pub amount_in: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<usize>,
}

/// One candidate route: the pools traversed in order, the simulated
/// output, the exchange of every hop and the estimated execution cost.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TradePath {
    pub pools: Vec<PoolRef>,
    #[serde(default, with = "crate::types::decimal")]
    pub amount_out: U256,
    pub dexes: Vec<String>,
    #[serde(default, with = "crate::types::decimal")]
    pub gas_cost: U256,
}

impl TradePath {
    pub fn hops(&self) -> usize {
        self.pools.len()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(default, with = "crate::types::decimal")]
    pub amount_out: U256,
    pub paths: Vec<TradePath>,
    pub best_path: TradePath,
    #[serde(default, with = "crate::types::decimal")]
    pub gas_estimate: U256,
    #[serde(rename = "processingTime")]
    pub processing_time_ms: u64,
}
