use alloy_primitives::{Address, U256};
use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use dex_aggregator::{GraphSnapshot, PathFinder, Pool, PoolRef, PriceCalculator, Token};
use std::hint::black_box;
use std::sync::Arc;

fn ether(value: u64) -> U256 {
    U256::from(value) * U256::from(10u64).pow(U256::from(18u64))
}

fn token(byte: u8) -> Token {
    Token::new(Address::repeat_byte(byte), format!("T{byte}"), 18)
}

fn pool(address: u8, token0: Token, token1: Token) -> PoolRef {
    PoolRef::new(Pool {
        address: Address::repeat_byte(address),
        exchange: "Uniswap V2".to_string(),
        version: "v2".to_string(),
        token0,
        token1,
        reserve0: ether(1_000),
        reserve1: ether(1_000),
        fee: 3,
        last_updated: Utc::now(),
    })
}

/// Hub-and-spoke graph: a dozen tokens all paired against a base token,
/// plus a ring of cross pairs so multi-hop routes exist.
fn build_snapshot() -> GraphSnapshot {
    let base = token(0x01);
    let mut pools = Vec::new();
    let mut address = 0x40u8;

    for byte in 0x02..=0x0d {
        pools.push(pool(address, base.clone(), token(byte)));
        address += 1;
    }
    for byte in 0x02..=0x0c {
        pools.push(pool(address, token(byte), token(byte + 1)));
        address += 1;
    }

    GraphSnapshot::build(pools)
}

fn benchmark_find_best_paths(c: &mut Criterion) {
    let snapshot = build_snapshot();
    let finder = PathFinder::new(Arc::new(PriceCalculator::new()));

    let token_in = Address::repeat_byte(0x02);
    let token_out = Address::repeat_byte(0x0d);

    c.bench_function("find_best_paths", |b| {
        b.iter(|| {
            finder
                .find_best_paths(
                    black_box(&snapshot),
                    black_box(token_in),
                    black_box(token_out),
                    black_box(ether(1)),
                    black_box(4),
                    black_box(20),
                    None,
                )
                .unwrap();
        })
    });
}

criterion_group!(benches, benchmark_find_best_paths);
criterion_main!(benches);
