use crate::calculator::PriceCalculator;
use crate::error::QuoteError;
use crate::graph::{FastHashMap, GraphSnapshot};
use crate::types::PoolRef;
use alloy_primitives::{Address, U256};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Result of one path search, with per-candidate accounting: every
/// simulated hop either extended the frontier or was skipped (zero
/// output, slippage, unknown token). The router uses the counts to tell
/// "nothing to try" apart from "candidates existed, none viable".
#[derive(Debug, Default)]
pub struct PathSearch {
    pub paths: Vec<Vec<PoolRef>>,
    pub candidates: usize,
    pub skipped: usize,
}

/// A frontier entry: the pools walked so far, the token the path
/// currently sits on and the output accumulated reaching it.
struct SearchState {
    path: Vec<PoolRef>,
    last_token: Address,
    amount_out: U256,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.amount_out == other.amount_out
    }
}

impl Eq for SearchState {}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap on accumulated output.
        self.amount_out.cmp(&other.amount_out)
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Yield-first best-path search over one immutable graph snapshot.
///
/// A max-priority queue explores states in descending output order.
/// `best_known` remembers the highest output seen reaching each token:
/// popped states strictly below it are discarded, and a next hop is
/// enqueued only when it strictly improves on the best known output at
/// its token.
pub struct PathFinder {
    calculator: Arc<PriceCalculator>,
}

impl PathFinder {
    pub fn new(calculator: Arc<PriceCalculator>) -> Self {
        Self { calculator }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn find_best_paths(
        &self,
        snapshot: &GraphSnapshot,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        max_hops: usize,
        max_paths: usize,
        deadline: Option<Instant>,
    ) -> Result<PathSearch, QuoteError> {
        let mut search = PathSearch::default();

        if !snapshot.contains_token(token_in) || !snapshot.contains_token(token_out) {
            debug!(
                token_in = %token_in,
                token_out = %token_out,
                "endpoint missing from graph, returning no paths"
            );
            return Ok(search);
        }
        if max_paths == 0 {
            return Ok(search);
        }

        let mut queue: BinaryHeap<SearchState> = BinaryHeap::new();
        let mut best_known: FastHashMap<Address, U256> = FastHashMap::default();

        // Seed with every first hop out of token_in.
        for (neighbor, edge) in snapshot.neighbors(token_in) {
            for pool in &edge.pools {
                search.candidates += 1;
                let Some(hop_out) = self.simulate_hop(pool, amount_in, token_in, &mut search)
                else {
                    continue;
                };

                queue.push(SearchState {
                    path: vec![pool.clone()],
                    last_token: neighbor,
                    amount_out: hop_out,
                });
                let best = best_known.entry(neighbor).or_insert(hop_out);
                if hop_out > *best {
                    *best = hop_out;
                }
            }
        }

        while let Some(state) = queue.pop() {
            if search.paths.len() >= max_paths {
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(QuoteError::DeadlineExceeded);
                }
            }

            // A superior route to this token was already explored.
            if let Some(best) = best_known.get(&state.last_token) {
                if state.amount_out < *best {
                    continue;
                }
            }

            if state.last_token == token_out {
                search.paths.push(state.path);
                continue;
            }
            if state.path.len() >= max_hops {
                continue;
            }

            for (next_token, edge) in snapshot.neighbors(state.last_token) {
                // Loop avoidance: never revisit a token already touched
                // by any pool in the path.
                if path_visits(&state.path, next_token) {
                    continue;
                }

                for pool in &edge.pools {
                    search.candidates += 1;
                    let Some(hop_out) =
                        self.simulate_hop(pool, state.amount_out, state.last_token, &mut search)
                    else {
                        continue;
                    };

                    let improves =
                        best_known.get(&next_token).map_or(true, |best| hop_out > *best);
                    if !improves {
                        continue;
                    }
                    best_known.insert(next_token, hop_out);

                    let mut path = Vec::with_capacity(state.path.len() + 1);
                    path.extend_from_slice(&state.path);
                    path.push(pool.clone());
                    queue.push(SearchState { path, last_token: next_token, amount_out: hop_out });
                }
            }
        }

        debug!(
            found = search.paths.len(),
            candidates = search.candidates,
            skipped = search.skipped,
            "path search finished"
        );
        Ok(search)
    }

    /// Simulate one hop; `None` means the candidate was skipped and
    /// counted (zero output, slippage, unknown token).
    fn simulate_hop(
        &self,
        pool: &PoolRef,
        amount_in: U256,
        token_in: Address,
        search: &mut PathSearch,
    ) -> Option<U256> {
        match self.calculator.calculate_output(pool, amount_in, token_in) {
            Ok(out) if !out.is_zero() => Some(out),
            Ok(_) => {
                search.skipped += 1;
                None
            }
            Err(err) => {
                debug!(pool = %pool.address, %err, "candidate hop skipped");
                search.skipped += 1;
                None
            }
        }
    }
}

/// Whether `token` is an endpoint of any pool already in the path. The
/// origin token is an endpoint of the first pool, so paths can never
/// turn back into it either.
fn path_visits(path: &[PoolRef], token: Address) -> bool {
    path.iter().any(|pool| pool.token0.address == token || pool.token1.address == token)
}
