//! Rank-owned band of the global grid.
//!
//! Cells live in two buffers: `cells[phase]` is the current generation (read),
//! `cells[1 - phase]` receives the next one. The buffers are swapped after every
//! compute so no cell is overwritten while a neighbor still needs its old value.

use rand::RngCore;
use rand::SeedableRng;

use super::cell::{Cell, CellState};

/// Per-rank partition dimensions. Every rank holds the same shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartitionShape {
    pub rows: usize,
    pub cols: usize,
}

impl PartitionShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Split an `n x n` cell budget over `ranks` ranks.
    ///
    /// Each rank gets `n / ranks` rows (at least one) and as many columns as
    /// it takes to hold its `n² / ranks` share. When `n < ranks` every rank
    /// degenerates to a single row.
    pub fn for_grid(n: usize, ranks: usize) -> Self {
        assert!(n > 0 && ranks > 0, "grid dimension and rank count must be positive");
        let rows = if n < ranks { 1 } else { n / ranks };
        let total = n * n;
        let cols = if total < ranks { 1 } else { (total / ranks) / rows };
        Self { rows, cols: cols.max(1) }
    }

    #[inline]
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

#[derive(Clone, Debug)]
pub struct LocalPartition {
    shape: PartitionShape,
    cells: [Vec<Cell>; 2],
    phase: usize,
}

impl LocalPartition {
    /// An all-dead partition.
    pub fn new(shape: PartitionShape) -> Self {
        assert!(
            shape.rows > 0 && shape.cols > 0,
            "partition shape must be non-empty, got {}x{}",
            shape.rows,
            shape.cols
        );
        let count = shape.cell_count();
        Self {
            shape,
            cells: [vec![Cell::default(); count], vec![Cell::default(); count]],
            phase: 0,
        }
    }

    /// Build from row-major states. Panics if the slice length does not match.
    pub fn from_states(shape: PartitionShape, states: &[CellState]) -> Self {
        assert_eq!(
            states.len(),
            shape.cell_count(),
            "expected {} states for a {}x{} partition",
            shape.cell_count(),
            shape.rows,
            shape.cols
        );
        let mut partition = Self::new(shape);
        for (cell, &state) in partition.current_mut().iter_mut().zip(states) {
            cell.state = state;
        }
        partition
    }

    /// Deterministic initial population: one draw per cell from a `StdRng`
    /// seeded with `seed`, even draw -> alive, odd draw -> dead.
    pub fn from_seed(shape: PartitionShape, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut partition = Self::new(shape);
        for cell in partition.current_mut() {
            cell.state = CellState::from_alive(rng.next_u32() % 2 == 0);
        }
        partition
    }

    #[inline]
    pub fn shape(&self) -> PartitionShape {
        self.shape
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.shape.rows && col < self.shape.cols,
            "cell ({row}, {col}) out of range for {}x{} partition",
            self.shape.rows,
            self.shape.cols
        );
        row * self.shape.cols + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.current()[self.index(row, col)].state
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, state: CellState) {
        let idx = self.index(row, col);
        self.current_mut()[idx].state = state;
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.current()[self.index(row, col)]
    }

    #[inline]
    pub(crate) fn current(&self) -> &[Cell] {
        &self.cells[self.phase]
    }

    #[inline]
    pub(crate) fn current_mut(&mut self) -> &mut [Cell] {
        &mut self.cells[self.phase]
    }

    /// Cells of one local row in the current generation.
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = self.index(row, 0);
        &self.current()[start..start + self.shape.cols]
    }

    /// Copy the states of `row` into `out`, replacing its contents.
    pub fn copy_row_states(&self, row: usize, out: &mut Vec<CellState>) {
        out.clear();
        out.extend(self.row(row).iter().map(|cell| cell.state));
    }

    pub fn top_row_states(&self) -> Vec<CellState> {
        let mut out = Vec::with_capacity(self.shape.cols);
        self.copy_row_states(0, &mut out);
        out
    }

    pub fn bottom_row_states(&self) -> Vec<CellState> {
        let mut out = Vec::with_capacity(self.shape.cols);
        self.copy_row_states(self.shape.rows - 1, &mut out);
        out
    }

    /// Row-major states of the whole partition.
    pub fn states(&self) -> Vec<CellState> {
        self.current().iter().map(|cell| cell.state).collect()
    }

    pub fn population(&self) -> u64 {
        self.current().iter().filter(|c| c.state.is_alive()).count() as u64
    }

    /// Apply the transition rule to every cell, writing into the next buffer,
    /// then make it current. Neighbor fields must already be populated.
    ///
    /// Returns the number of cells whose state changed.
    pub fn advance(&mut self) -> usize {
        let (current, next) = self.current_and_next_mut();
        let mut changed = 0;
        for (src, dst) in current.iter().zip(next.iter_mut()) {
            let state = src.next_state();
            changed += usize::from(state != src.state);
            *dst = Cell::new(state);
        }
        self.phase ^= 1;
        changed
    }

    #[inline]
    fn current_and_next_mut(&mut self) -> (&[Cell], &mut [Cell]) {
        let (a, b) = self.cells.split_at_mut(1);
        if self.phase == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }
}
