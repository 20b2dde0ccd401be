use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Token metadata. The address is the identity; symbol and decimals are
/// informational. Raw 20-byte addresses make case canonicalization
/// structural: any mix of upper/lower-case hex input parses to the same
/// value and serializes back as lowercase hex.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self { address, symbol: symbol.into(), decimals }
    }

    /// Fallback returned for addresses the store has never seen.
    pub fn unknown(address: Address) -> Self {
        Self { address, symbol: "UNKNOWN".to_string(), decimals: 18 }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:#x}", self.symbol, self.address)
    }
}

/// Unordered pair of token addresses, stored in canonical order. This is
/// the edge key for the pair index and the graph: `TokenPair::new(a, b)`
/// and `TokenPair::new(b, a)` are the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenPair {
    lo: Address,
    hi: Address,
}

impl TokenPair {
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> Address {
        self.lo
    }

    pub fn hi(&self) -> Address {
        self.hi
    }
}

impl Display for TokenPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}:{:#x}", self.lo, self.hi)
    }
}
