use crate::calculator::PriceCalculator;
use crate::config::PerformanceConfig;
use crate::constants::{BASE_TX_GAS, MAX_HOP_LIMIT};
use crate::error::QuoteError;
use crate::graph::TradingGraph;
use crate::path_finder::PathFinder;
use crate::types::{DexKind, PoolRef, QuoteRequest, QuoteResponse, TradePath};
use alloy_primitives::{Address, U256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Candidate count shrinks for large inputs to bound work.
const LARGE_AMOUNT_WEI: u64 = 1_000_000_000_000_000_000;
const LARGE_AMOUNT_MAX_PATHS: usize = 10;

#[derive(Default)]
struct EvalCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    errors: AtomicUsize,
}

/// Coordinates a single quote: path search on the current snapshot,
/// bounded concurrent re-evaluation of every candidate, then selection
/// by raw output.
///
/// The evaluation budget is per quote: every call allocates its own
/// semaphore of width `max_concurrent_paths`, so one in-flight quote
/// never throttles another.
pub struct Router {
    graph: Arc<TradingGraph>,
    finder: PathFinder,
    calculator: Arc<PriceCalculator>,
    config: PerformanceConfig,
    peak_quote_evaluations: AtomicUsize,
}

impl Router {
    pub fn new(graph: Arc<TradingGraph>, config: PerformanceConfig) -> Self {
        let calculator = Arc::new(PriceCalculator::with_max_slippage(config.max_slippage));
        Self {
            graph,
            finder: PathFinder::new(Arc::clone(&calculator)),
            calculator,
            config,
            peak_quote_evaluations: AtomicUsize::new(0),
        }
    }

    pub fn calculator(&self) -> &Arc<PriceCalculator> {
        &self.calculator
    }

    /// Highest number of path evaluations observed running at once
    /// within any single quote, for introspection and tests of the
    /// per-quote semaphore bound.
    pub fn peak_concurrent_evaluations(&self) -> usize {
        self.peak_quote_evaluations.load(Ordering::Relaxed)
    }

    /// Find the best quote for `req`.
    ///
    /// The whole call is bounded by the configured request timeout and
    /// maps expiry to [`QuoteError::DeadlineExceeded`]. Dropping the
    /// returned future cancels the search and every worker at its next
    /// suspension point; cancellation never surfaces as partial data.
    pub async fn get_best_quote(&self, req: &QuoteRequest) -> Result<QuoteResponse, QuoteError> {
        let started = Instant::now();
        match tokio::time::timeout(self.config.request_timeout(), self.quote_inner(req, started))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(QuoteError::DeadlineExceeded),
        }
    }

    async fn quote_inner(
        &self,
        req: &QuoteRequest,
        started: Instant,
    ) -> Result<QuoteResponse, QuoteError> {
        if req.amount_in.is_zero() {
            return Err(QuoteError::InvalidInput("amountIn must be positive".to_string()));
        }
        let max_hops = req.max_hops.unwrap_or(self.config.max_hops);
        if !(1..=MAX_HOP_LIMIT).contains(&max_hops) {
            return Err(QuoteError::InvalidInput(format!(
                "maxHops must be between 1 and {MAX_HOP_LIMIT}, got {max_hops}"
            )));
        }

        let max_paths = if req.amount_in > U256::from(LARGE_AMOUNT_WEI) {
            LARGE_AMOUNT_MAX_PATHS
        } else {
            self.config.max_paths
        };

        info!(
            token_in = %req.token_in,
            token_out = %req.token_out,
            amount_in = %req.amount_in,
            max_hops,
            max_paths,
            "quote request"
        );

        let snapshot = self.graph.snapshot()?;
        let deadline = started + self.config.request_timeout();
        let search = self.finder.find_best_paths(
            snapshot.as_ref(),
            req.token_in,
            req.token_out,
            req.amount_in,
            max_hops,
            max_paths,
            Some(deadline),
        )?;

        debug!(
            found = search.paths.len(),
            candidates = search.candidates,
            skipped = search.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "path search complete"
        );

        if search.paths.is_empty() {
            // Candidates that existed but were all rejected mean the
            // route space is connected yet unviable at this size.
            return Err(if search.skipped > 0 {
                QuoteError::NoViableQuote
            } else {
                QuoteError::NoPath
            });
        }

        let mut trade_paths = self.evaluate_paths(search.paths, req).await?;
        if trade_paths.is_empty() {
            return Err(QuoteError::NoViableQuote);
        }

        trade_paths.sort_by(|a, b| b.amount_out.cmp(&a.amount_out));
        let best_path = trade_paths[0].clone();

        info!(
            amount_out = %best_path.amount_out,
            hops = best_path.hops(),
            gas = %best_path.gas_cost,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "quote complete"
        );

        Ok(QuoteResponse {
            amount_out: best_path.amount_out,
            gas_estimate: best_path.gas_cost,
            best_path,
            paths: trade_paths,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Re-compute every candidate through the calculator under a
    /// semaphore owned by this call, so the concurrency bound applies
    /// per quote. Candidate-level failures are counted and logged,
    /// never surfaced; only cancellation aborts the evaluation.
    async fn evaluate_paths(
        &self,
        paths: Vec<Vec<PoolRef>>,
        req: &QuoteRequest,
    ) -> Result<Vec<TradePath>, QuoteError> {
        let mut workers: JoinSet<Option<TradePath>> = JoinSet::new();
        let quote_semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_paths));
        let counters = Arc::new(EvalCounters::default());

        for (index, path) in paths.into_iter().enumerate() {
            let semaphore = Arc::clone(&quote_semaphore);
            let calculator = Arc::clone(&self.calculator);
            let counters = Arc::clone(&counters);
            let amount_in = req.amount_in;
            let token_in = req.token_in;
            let token_out = req.token_out;

            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };

                let running = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                counters.peak.fetch_max(running, Ordering::SeqCst);
                let result = calculator.calculate_path_output(&path, amount_in, token_in, token_out);
                counters.in_flight.fetch_sub(1, Ordering::SeqCst);

                match result {
                    Ok(amount_out) if !amount_out.is_zero() => {
                        let gas_cost = estimate_gas_cost(&path);
                        let dexes = dexes_for_path(&path);
                        Some(TradePath { pools: path, amount_out, dexes, gas_cost })
                    }
                    Ok(_) => {
                        debug!(path = index, "candidate produced zero output");
                        None
                    }
                    Err(err) => {
                        counters.errors.fetch_add(1, Ordering::Relaxed);
                        debug!(path = index, %err, "candidate evaluation failed");
                        None
                    }
                }
            });
        }

        let mut trade_paths = Vec::new();
        let mut dropped = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Some(trade_path)) => trade_paths.push(trade_path),
                Ok(None) => dropped += 1,
                Err(err) if err.is_cancelled() => return Err(QuoteError::Canceled),
                Err(err) => {
                    warn!(%err, "path evaluation worker failed");
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            debug!(dropped, "candidates dropped during evaluation");
        }

        self.peak_quote_evaluations
            .fetch_max(counters.peak.load(Ordering::SeqCst), Ordering::SeqCst);
        Ok(trade_paths)
    }
}

/// `21_000` base transaction gas plus a per-pool cost keyed by the
/// exchange the pool belongs to.
pub fn estimate_gas_cost(path: &[PoolRef]) -> U256 {
    let swap_gas: u64 =
        path.iter().map(|pool| DexKind::from_exchange_name(&pool.exchange).swap_gas()).sum();
    U256::from(BASE_TX_GAS + swap_gas)
}

/// Exchange names of every hop, in path order.
pub fn dexes_for_path(path: &[PoolRef]) -> Vec<String> {
    path.iter().map(|pool| pool.exchange.clone()).collect()
}
