//! Property-based tests for the ring engine.
//!
//! - the transition rule matches survive-on-2-or-3 / birth-on-3-or-more
//! - any ring split of a torus evolves exactly like the unsplit torus
//! - the cell count never changes

use std::time::Duration;

use proptest::prelude::*;

use ring_life::ringlife::{
    CellState, GlobalGrid, LocalPartition, PartitionShape, next_state, run_partitions,
};
use ring_life::torus::{TorusLife, TorusLifeConfig};

fn state_strategy() -> impl Strategy<Value = CellState> {
    prop_oneof![Just(CellState::Alive), Just(CellState::Dead)]
}

/// (rows per rank, cols, ranks, states)
fn ring_strategy() -> impl Strategy<Value = (usize, usize, usize, Vec<CellState>)> {
    (1usize..=4, 1usize..=7, 1usize..=4).prop_flat_map(|(rows, cols, ranks)| {
        (
            Just(rows),
            Just(cols),
            Just(ranks),
            prop::collection::vec(state_strategy(), rows * cols * ranks),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        max_shrink_iters: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_rule_matches_definition(state in state_strategy(), count in 0u8..=8) {
        let expected = match state {
            CellState::Alive => count == 2 || count == 3,
            CellState::Dead => count >= 3,
        };
        prop_assert_eq!(next_state(state, count).is_alive(), expected);
    }

    #[test]
    fn prop_ring_matches_torus(
        (rows, cols, ranks, states) in ring_strategy(),
        generations in 1u64..=5,
    ) {
        let shape = PartitionShape::new(rows, cols);
        let partitions: Vec<LocalPartition> = states
            .chunks(shape.cell_count())
            .map(|band| LocalPartition::from_states(shape, band))
            .collect();
        let start = GlobalGrid::from_partitions(&partitions);

        let mut torus = TorusLife::with_config(
            start.rows(),
            start.cols(),
            TorusLifeConfig::default().thread_count(1),
        );
        for r in 0..start.rows() {
            for c in 0..start.cols() {
                torus.set_cell(r, c, start.get(r, c));
            }
        }
        torus.step_n(generations);

        let run = run_partitions(
            partitions,
            generations,
            None,
            Some(Duration::from_secs(10)),
            None,
        )
        .expect("ring run");

        prop_assert_eq!(run.grid.cell_count(), rows * cols * ranks);
        prop_assert_eq!(run.grid, torus.to_grid());
    }
}
