use super::{Token, TokenPair};
use crate::constants::DEFAULT_POOL_FEE;
use crate::error::StoreError;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display as StrumDisplay, EnumString};

/// Shared handle to an immutable pool record. Pool updates happen by
/// replacement in the store; a record referenced by a graph snapshot is
/// never mutated in place.
pub type PoolRef = Arc<Pool>;

/// A constant-product liquidity pool with a fixed proportional fee.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub exchange: String,
    pub version: String,
    pub token0: Token,
    pub token1: Token,
    #[serde(default, with = "crate::types::decimal")]
    pub reserve0: U256,
    #[serde(default, with = "crate::types::decimal")]
    pub reserve1: U256,
    #[serde(default = "default_fee")]
    pub fee: u32,
    pub last_updated: DateTime<Utc>,
}

fn default_fee() -> u32 {
    DEFAULT_POOL_FEE
}

impl Pool {
    pub fn contains_token(&self, token: Address) -> bool {
        self.token0.address == token || self.token1.address == token
    }

    /// The opposite side of the pair, if `token` belongs to the pool.
    pub fn other_token(&self, token: Address) -> Option<Address> {
        if self.token0.address == token {
            Some(self.token1.address)
        } else if self.token1.address == token {
            Some(self.token0.address)
        } else {
            None
        }
    }

    /// Reserves oriented for a swap entering with `token_in`.
    pub fn reserves_for(&self, token_in: Address) -> Option<(U256, U256)> {
        if self.token0.address == token_in {
            Some((self.reserve0, self.reserve1))
        } else if self.token1.address == token_in {
            Some((self.reserve1, self.reserve0))
        } else {
            None
        }
    }

    /// `reserve0 * reserve1`, the depth heuristic aggregated per edge.
    pub fn liquidity(&self) -> U256 {
        self.reserve0.saturating_mul(self.reserve1)
    }

    pub fn pair(&self) -> TokenPair {
        TokenPair::new(self.token0.address, self.token1.address)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.token0.address == self.token1.address {
            return Err(StoreError::InvalidPool(format!(
                "pool {:#x} has identical tokens {:#x}",
                self.address, self.token0.address
            )));
        }
        Ok(())
    }
}

impl Hash for Pool {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state)
    }
}

impl PartialEq for Pool {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Pool {}

impl Display for Pool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}/{})@{:#x}", self.exchange, self.token0.symbol, self.token1.symbol, self.address)
    }
}

/// DEX exchange configuration; informational, used by the seeder and for
/// per-exchange cost attribution.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    pub name: String,
    pub factory: Address,
    pub router: Address,
    pub version: String,
}

/// Known exchange families, matched case-insensitively on the pool's
/// exchange name. Unrecognized names fall through to `Other` with a
/// conservative default swap cost.
#[derive(Clone, Debug, PartialEq, Eq, EnumString, StrumDisplay)]
pub enum DexKind {
    #[strum(serialize = "uniswap v2")]
    UniswapV2,
    #[strum(serialize = "sushiswap")]
    SushiSwap,
    #[strum(default)]
    Other(String),
}

impl DexKind {
    pub fn from_exchange_name(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        match Self::from_str(&normalized) {
            Ok(kind) => kind,
            Err(_) => Self::Other(normalized),
        }
    }

    /// Gas consumed by one swap through a pool of this exchange family.
    pub fn swap_gas(&self) -> u64 {
        match self {
            Self::UniswapV2 => 100_000,
            Self::SushiSwap => 120_000,
            Self::Other(_) => 110_000,
        }
    }
}
