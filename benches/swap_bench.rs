use clmm_pool::math::swap_math::compute_swap_step;
use clmm_pool::math::tick_math::{
    get_sqrt_price_at_tick, get_tick_at_sqrt_price, MAX_TICK, MIN_TICK,
};
use clmm_pool::pool::tick::TickDirectory;
use clmm_pool::Q64;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn bench_tick_math(c: &mut Criterion) {
    c.bench_function("sqrt_price_at_tick", |b| {
        let mut tick = MIN_TICK;
        b.iter(|| {
            tick = if tick >= MAX_TICK { MIN_TICK } else { tick + 997 };
            black_box(get_sqrt_price_at_tick(black_box(tick)).unwrap())
        })
    });

    c.bench_function("tick_at_sqrt_price", |b| {
        let prices: Vec<u128> = (-400..400)
            .map(|i| get_sqrt_price_at_tick(i * 1_009).unwrap())
            .collect();
        let mut cursor = 0usize;
        b.iter(|| {
            cursor = (cursor + 1) % prices.len();
            black_box(get_tick_at_sqrt_price(black_box(prices[cursor])).unwrap())
        })
    });
}

fn bench_swap_step(c: &mut Criterion) {
    let target = get_sqrt_price_at_tick(-100).unwrap();
    c.bench_function("compute_swap_step", |b| {
        b.iter(|| {
            black_box(
                compute_swap_step(
                    black_box(Q64),
                    black_box(target),
                    black_box(10u128.pow(15)),
                    black_box(1_000_000),
                    1_000,
                    true,
                    true,
                )
                .unwrap(),
            )
        })
    });
}

fn bench_tick_directory(c: &mut Criterion) {
    let mut directory = TickDirectory::new(1);
    for tick in (-400_000..400_000).step_by(5_003) {
        directory.mark(tick);
    }
    c.bench_function("directory_next_active", |b| {
        let mut from = 0i32;
        b.iter(|| {
            from = if from > 390_000 { -390_000 } else { from + 7_919 };
            black_box(directory.next_active(black_box(from), from % 2 == 0))
        })
    });
}

criterion_group!(
    swap_benches,
    bench_tick_math,
    bench_swap_step,
    bench_tick_directory,
);
criterion_main!(swap_benches);
