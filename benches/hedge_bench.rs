use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dn_hedge_log::{evaluate_rehedge, HedgeCalculator, NewPosition, OptionType, PositionStore, StoreFile};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn position(strike: i64) -> NewPosition {
    NewPosition {
        underlying_symbol: "BTC".to_string(),
        expiry: "29MAR".to_string(),
        option_type: if strike % 2 == 0 { OptionType::Call } else { OptionType::Put },
        strike: Decimal::from(strike),
        size: dec!(1.5),
        entry_delta: dec!(0.42),
        band: dec!(0.05),
    }
}

fn populated_store(count: i64) -> PositionStore {
    let calc = HedgeCalculator::default();
    let mut store = PositionStore::new();
    for i in 0..count {
        store.create(position(60000 + i * 500), &calc, Utc::now()).unwrap();
    }
    store
}

/// Band check, run on every delta update
fn bench_evaluate_rehedge(c: &mut Criterion) {
    c.bench_function("evaluate_rehedge", |b| {
        b.iter(|| {
            black_box(evaluate_rehedge(
                black_box(dec!(0.705)),
                black_box(dec!(0.60)),
                black_box(dec!(0.05)),
            ))
        });
    });
}

fn bench_decide(c: &mut Criterion) {
    let calc = HedgeCalculator::default();
    let store = populated_store(1);
    let pos = &store.list_active()[0];

    c.bench_function("decide", |b| {
        b.iter(|| black_box(calc.decide(pos, black_box(dec!(0.47))).unwrap()));
    });
}

/// Full save + load of the store file
fn bench_store_round_trip(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let file = StoreFile::in_dir(dir.path());

    let mut group = c.benchmark_group("store_round_trip");
    for count in [1i64, 10, 100].iter() {
        let store = populated_store(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &store, |b, store| {
            b.iter(|| {
                file.save(store).unwrap();
                black_box(file.load().unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate_rehedge, bench_decide, bench_store_round_trip);
criterion_main!(benches);
