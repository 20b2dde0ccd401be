use alloy_primitives::{address, Address};

pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const USDT: Address = address!("0xdAC17F958D2ee523a2206206994597C13D831ec7");
pub const USDC: Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const DAI: Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");

/// Fee numerator of the constant-product formula: the effective input is
/// `amount_in * 997 / 1000` (0.3% proportional fee).
pub const FEE_NUMERATOR: u64 = 997;
pub const FEE_DENOMINATOR: u64 = 1000;

/// Default per-pool fee field value, in tenths of a percent.
pub const DEFAULT_POOL_FEE: u32 = 3;

/// Base transaction gas charged once per quote on top of per-pool swap gas.
pub const BASE_TX_GAS: u64 = 21_000;

/// Hard ceiling on the per-request hop bound.
pub const MAX_HOP_LIMIT: usize = 6;

#[non_exhaustive]
pub struct EthFactoryAddress;

impl EthFactoryAddress {
    pub const UNISWAP_V2: Address = address!("5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f");
    pub const SUSHISWAP_V2: Address = address!("c0aee478e3658e2610c5f7a4a2e1777ce9e4f2ac");
}

#[non_exhaustive]
pub struct EthRouterAddress;

impl EthRouterAddress {
    pub const UNISWAP_V2: Address = address!("7a250d5630b4cf539739df2c5dacb4c659f2488d");
    pub const SUSHISWAP_V2: Address = address!("d9e1ce17f2641f24ae83637ab66a2cca9c378b9f");
}
