#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use ring_life::ringlife::{NullDisplay, RingLifeConfig, run_ring};

const MASTER_SEED: u64 = 0x5EED_1234_ABCD_EF01;

fn bench_ring(n: usize, ranks: usize, generations: u64) -> (f64, f64, f64, u64) {
    let config = RingLifeConfig::new(n, generations)
        .ranks(ranks)
        .master_seed(MASTER_SEED)
        .display_every(None);
    let mut sink = NullDisplay;
    let run = run_ring(&config, Some(&mut sink)).expect("ring run failed");
    (
        run.elapsed.as_secs_f64() * 1000.0,
        run.exchange_time().as_secs_f64() * 1000.0,
        run.compute_time().as_secs_f64() * 1000.0,
        run.grid.population(),
    )
}

fn main() {
    let cases: &[(usize, usize, u64)] = &[
        (256, 1, 200),
        (256, 4, 200),
        (1024, 4, 50),
        (1024, 8, 50),
        (2048, 8, 20),
        (2048, 16, 20),
    ];

    println!(
        "{:<10} {:>6} {:>8} {:>12} {:>12} {:>12} {:>10}",
        "Grid", "Ranks", "Gens", "Total(ms)", "Comm(ms)", "Comp(ms)", "Avg(ms)"
    );
    println!("{}", "-".repeat(76));

    for &(n, ranks, generations) in cases {
        let (total_ms, comm_ms, comp_ms, _pop) = bench_ring(n, ranks, generations);
        let avg_ms = total_ms / generations as f64;
        println!(
            "{:<10} {:>6} {:>8} {:>12.1} {:>12.1} {:>12.1} {:>10.4}",
            format!("{}x{}", n, n),
            ranks,
            generations,
            total_ms,
            comm_ms,
            comp_ms,
            avg_ms
        );
    }
}
