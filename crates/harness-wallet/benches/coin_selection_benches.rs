//! Criterion benchmarks for first-fit funding.
//!
//! Covers: funding against small and large UTXO lists where the target
//! forces selection deep into the list.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use harness_core::types::{Hash256, Network, OutPoint, TxOut};
use harness_core::{Amount, EstimatingSerializer, UtxoProvider};
use harness_wallet::{CoinSelector, InMemoryWallet};

fn funded_wallet(n: usize) -> InMemoryWallet {
    let wallet = InMemoryWallet::new([7u8; 32], Network::Simnet);
    for i in 0..n {
        let mut hash = [0u8; 32];
        hash[..8].copy_from_slice(&(i as u64).to_le_bytes());
        wallet
            .credit("default", Amount::from_atoms(10_000), OutPoint::new(Hash256(hash), 0, 0))
            .expect("credit");
    }
    wallet
}

fn bench_fund(c: &mut Criterion) {
    let mut group = c.benchmark_group("fund_first_fit");
    for n in [10usize, 100, 1_000] {
        let wallet = funded_wallet(n);
        let unspent = wallet.list_unspent("default").expect("list");
        // Needs roughly half of the list once fees are counted.
        let target = Amount::from_atoms(10_000 * (n as i64) / 2);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let selector = CoinSelector::new(&wallet, &wallet, &EstimatingSerializer);
                selector
                    .fund(
                        "default",
                        black_box(&unspent),
                        vec![TxOut::new(target, vec![0x51; 25])],
                        Amount::from_atoms(1),
                    )
                    .expect("fund")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fund);
criterion_main!(benches);
