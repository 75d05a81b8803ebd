use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use ring_life::ringlife::{
    CellState, GlobalGrid, LocalPartition, PartitionShape, RingLifeConfig, distribute_seeds,
    run_partitions, run_ring,
};
use ring_life::torus::TorusLife;

const TIMEOUT: Option<Duration> = Some(Duration::from_secs(10));

fn random_partitions(shape: PartitionShape, ranks: usize, density: f64, seed: u64) -> Vec<LocalPartition> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..ranks)
        .map(|_| {
            let states: Vec<CellState> = (0..shape.cell_count())
                .map(|_| CellState::from_alive(rng.random::<f64>() < density))
                .collect();
            LocalPartition::from_states(shape, &states)
        })
        .collect()
}

fn run_parity_case(shape: PartitionShape, ranks: usize, density: f64, generations: u64, seed: u64) {
    let partitions = random_partitions(shape, ranks, density, seed);
    let mut torus = TorusLife::from_grid(&GlobalGrid::from_partitions(&partitions));
    torus.step_n(generations);

    let run = run_partitions(partitions, generations, None, TIMEOUT, None).expect("ring run");

    assert_eq!(
        run.grid.population(),
        torus.population(),
        "population mismatch for {ranks} ranks of {shape:?}, density {density} seed {seed}"
    );
    assert_eq!(
        run.grid,
        torus.to_grid(),
        "grid mismatch for {ranks} ranks of {shape:?}, density {density} seed {seed}"
    );
}

#[test]
fn parity_sparse_mid_dense() {
    let shape = PartitionShape::new(8, 32);
    run_parity_case(shape, 4, 0.10, 6, 0xA1);
    run_parity_case(shape, 4, 0.42, 6, 0xB2);
    run_parity_case(shape, 4, 0.83, 4, 0xC3);
}

#[test]
fn parity_multiple_seeds() {
    for seed in [11u64, 22, 33, 44] {
        run_parity_case(PartitionShape::new(6, 18), 3, 0.35, 7, seed);
    }
}

#[test]
fn parity_single_row_partitions() {
    run_parity_case(PartitionShape::new(1, 9), 7, 0.4, 5, 0x51);
    run_parity_case(PartitionShape::new(1, 4), 2, 0.5, 5, 0x52);
}

#[test]
fn parity_single_rank() {
    run_parity_case(PartitionShape::new(12, 12), 1, 0.4, 8, 0x61);
    run_parity_case(PartitionShape::new(1, 1), 1, 1.0, 3, 0x62);
}

#[test]
fn parity_two_ranks_share_both_neighbors() {
    run_parity_case(PartitionShape::new(3, 10), 2, 0.45, 9, 0x71);
}

#[test]
fn parity_seeded_config_including_degenerate_shapes() {
    for (n, ranks) in [(4, 2), (7, 3), (3, 5), (10, 4), (1, 1)] {
        let config = RingLifeConfig::new(n, 5)
            .ranks(ranks)
            .master_seed(0x5EED_0000 + n as u64)
            .display_every(None)
            .recv_timeout(TIMEOUT);
        let shape = config.shape();
        let partitions: Vec<LocalPartition> = distribute_seeds(config.master_seed, ranks)
            .into_iter()
            .map(|seed| LocalPartition::from_seed(shape, seed))
            .collect();
        let mut torus = TorusLife::from_grid(&GlobalGrid::from_partitions(&partitions));
        torus.step_n(config.generations);

        let run = run_ring(&config, None).expect("ring run");
        assert_eq!(run.grid, torus.to_grid(), "n={n} ranks={ranks}");
    }
}
