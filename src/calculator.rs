use crate::constants::{FEE_DENOMINATOR, FEE_NUMERATOR};
use crate::error::SwapError;
use crate::types::{Pool, PoolRef};
use alloy_primitives::{Address, U256};
use std::sync::RwLock;
use tracing::debug;

const DEFAULT_MAX_SLIPPAGE_PCT: f64 = 5.0;

/// Constant-product price calculator with a per-hop price-impact guard.
///
/// All amount arithmetic is exact `U256` with checked intermediates; an
/// overflowing product is a definite [`SwapError::AmountOverflow`], never
/// a silent wrap. Price impact is evaluated through `f64` ratios, which
/// is far inside the 1e-4 relative tolerance the guard needs.
pub struct PriceCalculator {
    max_slippage_pct: RwLock<f64>,
}

impl PriceCalculator {
    pub fn new() -> Self {
        Self::with_max_slippage(DEFAULT_MAX_SLIPPAGE_PCT)
    }

    pub fn with_max_slippage(max_slippage_pct: f64) -> Self {
        Self { max_slippage_pct: RwLock::new(max_slippage_pct) }
    }

    pub fn max_slippage(&self) -> f64 {
        *self.max_slippage_pct.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_max_slippage(&self, max_slippage_pct: f64) {
        *self.max_slippage_pct.write().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            max_slippage_pct;
    }

    /// Output of a single hop through `pool`, entering with `amount_in`
    /// of `token_in`.
    ///
    /// Zero input and zero reserves yield zero without error; an input
    /// token that matches neither pool token is [`SwapError::UnknownToken`];
    /// a price impact above the configured limit is
    /// [`SwapError::SlippageExceeded`].
    pub fn calculate_output(
        &self,
        pool: &Pool,
        amount_in: U256,
        token_in: Address,
    ) -> Result<U256, SwapError> {
        let (reserve_in, reserve_out) =
            pool.reserves_for(token_in).ok_or(SwapError::UnknownToken(token_in))?;

        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Ok(U256::ZERO);
        }
        if amount_in.is_zero() {
            return Ok(U256::ZERO);
        }

        self.check_slippage(reserve_in, reserve_out, amount_in)?;

        constant_product_output(reserve_in, reserve_out, amount_in)
    }

    /// Output of an ordered multi-hop path, carrying the running token
    /// and amount hop by hop. The slippage guard applies to every hop.
    pub fn calculate_path_output(
        &self,
        pools: &[PoolRef],
        amount_in: U256,
        token_in: Address,
        token_out: Address,
    ) -> Result<U256, SwapError> {
        if pools.is_empty() {
            return Ok(U256::ZERO);
        }

        let mut current_token = token_in;
        let mut current_amount = amount_in;

        for (hop, pool) in pools.iter().enumerate() {
            let next_token = pool.other_token(current_token).ok_or_else(|| {
                SwapError::PathMismatch(format!(
                    "hop {hop}: token {current_token:#x} not in pool {:#x}",
                    pool.address
                ))
            })?;

            current_amount = self.calculate_output(pool, current_amount, current_token)?;
            current_token = next_token;
        }

        if current_token != token_out {
            return Err(SwapError::PathMismatch(format!(
                "final token {current_token:#x} does not match requested {token_out:#x}"
            )));
        }

        Ok(current_amount)
    }

    /// Reject trades whose price impact exceeds the configured limit.
    ///
    /// `impact = (spot - effective) / spot` where `spot` is the pre-trade
    /// mid-price `reserve_out / reserve_in` and `effective` is the
    /// realized `amount_out / amount_in` including the fee.
    fn check_slippage(
        &self,
        reserve_in: U256,
        reserve_out: U256,
        amount_in: U256,
    ) -> Result<(), SwapError> {
        if amount_in.is_zero() {
            return Ok(());
        }

        let f_reserve_in = to_f64(reserve_in);
        if f_reserve_in == 0.0 {
            return Err(SwapError::ZeroReserve);
        }
        let spot_price = to_f64(reserve_out) / f_reserve_in;
        if spot_price == 0.0 {
            return Err(SwapError::ZeroReserve);
        }

        let amount_out = constant_product_output(reserve_in, reserve_out, amount_in)?;

        let f_amount_in = to_f64(amount_in);
        let effective_price = to_f64(amount_out) / f_amount_in;

        let impact_pct = (spot_price - effective_price) / spot_price * 100.0;
        let max = self.max_slippage();

        debug!(spot_price, effective_price, impact_pct, max, "slippage check");

        if impact_pct > max {
            return Err(SwapError::SlippageExceeded { impact: impact_pct, max });
        }
        Ok(())
    }
}

impl Default for PriceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// `floor(reserve_out * (amount_in * 997) / (reserve_in * 1000 + amount_in * 997))`
fn constant_product_output(
    reserve_in: U256,
    reserve_out: U256,
    amount_in: U256,
) -> Result<U256, SwapError> {
    let amount_in_with_fee =
        amount_in.checked_mul(U256::from(FEE_NUMERATOR)).ok_or(SwapError::AmountOverflow)?;
    let numerator =
        reserve_out.checked_mul(amount_in_with_fee).ok_or(SwapError::AmountOverflow)?;
    let denominator = reserve_in
        .checked_mul(U256::from(FEE_DENOMINATOR))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(SwapError::AmountOverflow)?;

    if denominator.is_zero() {
        return Ok(U256::ZERO);
    }
    Ok(numerator / denominator)
}

/// Lossy decimal conversion for ratio math only; exact amounts never pass
/// through here.
fn to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::INFINITY)
}
