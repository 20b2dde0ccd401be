use crate::types::PoolRef;
use ahash::RandomState;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;
use tracing::warn;

pub type FastHasher = RandomState;
pub type FastHashMap<K, V> = HashMap<K, V, FastHasher>;

/// Everything the graph knows about one token pair: the pools on the
/// edge in insertion order and the aggregate `reserve0 * reserve1` depth
/// across them.
#[derive(Clone, Debug, Default)]
pub struct EdgeWeight {
    pub pools: Vec<PoolRef>,
    pub liquidity: U256,
}

/// Immutable view of the trading graph built from one point-in-time
/// enumeration of the pool store.
///
/// Tokens are nodes, token pairs are undirected edges and every edge
/// carries the pools connecting its endpoints. A snapshot is never
/// mutated after [`GraphSnapshot::build`] returns; refreshes publish a
/// whole new snapshot and searches keep a shared reference to the one
/// they started on.
#[derive(Debug)]
pub struct GraphSnapshot {
    graph: UnGraph<Address, EdgeWeight, usize>,
    token_index: FastHashMap<Address, NodeIndex<usize>>,
    pool_count: usize,
    built_at: DateTime<Utc>,
}

impl GraphSnapshot {
    pub fn build(pools: impl IntoIterator<Item = PoolRef>) -> Self {
        let mut graph = UnGraph::<Address, EdgeWeight, usize>::default();
        let mut token_index = FastHashMap::<Address, NodeIndex<usize>>::default();
        let mut pool_count = 0usize;

        for pool in pools {
            let t0 = pool.token0.address;
            let t1 = pool.token1.address;
            if t0 == t1 {
                warn!(pool = %pool.address, "skipping pool with identical tokens");
                continue;
            }

            let n0 = *token_index.entry(t0).or_insert_with(|| graph.add_node(t0));
            let n1 = *token_index.entry(t1).or_insert_with(|| graph.add_node(t1));

            let liquidity = pool.liquidity();
            match graph.find_edge(n0, n1) {
                Some(edge) => {
                    let weight =
                        graph.edge_weight_mut(edge).expect("edge returned by find_edge exists");
                    weight.liquidity = weight.liquidity.saturating_add(liquidity);
                    weight.pools.push(pool);
                }
                None => {
                    graph.add_edge(n0, n1, EdgeWeight { pools: vec![pool], liquidity });
                }
            }
            pool_count += 1;
        }

        Self { graph, token_index, pool_count, built_at: Utc::now() }
    }

    pub fn contains_token(&self, token: Address) -> bool {
        self.token_index.contains_key(&token)
    }

    /// Neighbor tokens of `token` together with the connecting edge.
    /// Empty for tokens outside the graph. Deterministic order for one
    /// snapshot.
    pub fn neighbors(&self, token: Address) -> impl Iterator<Item = (Address, &EdgeWeight)> + '_ {
        self.token_index.get(&token).copied().into_iter().flat_map(move |index| {
            self.graph.edges(index).map(move |edge| {
                use petgraph::visit::EdgeRef;
                let other =
                    if edge.source() == index { edge.target() } else { edge.source() };
                (self.graph[other], edge.weight())
            })
        })
    }

    /// Pools on the unordered edge `{a, b}`, in insertion order; empty
    /// when no such edge exists. Symmetric in its arguments.
    pub fn pools_between(&self, a: Address, b: Address) -> &[PoolRef] {
        self.edge_weight(a, b).map(|weight| weight.pools.as_slice()).unwrap_or_default()
    }

    /// Aggregate `reserve0 * reserve1` depth across every pool on the
    /// edge `{a, b}`. Symmetric in its arguments.
    pub fn liquidity_between(&self, a: Address, b: Address) -> U256 {
        self.edge_weight(a, b).map(|weight| weight.liquidity).unwrap_or(U256::ZERO)
    }

    /// Every edge as `(endpoint, endpoint, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (Address, Address, &EdgeWeight)> + '_ {
        use petgraph::visit::EdgeRef;
        self.graph
            .edge_references()
            .map(|edge| (self.graph[edge.source()], self.graph[edge.target()], edge.weight()))
    }

    pub fn token_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn pool_count(&self) -> usize {
        self.pool_count
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    fn edge_weight(&self, a: Address, b: Address) -> Option<&EdgeWeight> {
        let ia = *self.token_index.get(&a)?;
        let ib = *self.token_index.get(&b)?;
        let edge = self.graph.find_edge(ia, ib)?;
        self.graph.edge_weight(edge)
    }
}
