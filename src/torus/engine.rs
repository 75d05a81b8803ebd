use rayon::prelude::*;

use crate::ringlife::{CellState, GlobalGrid, next_state};

/// Configuration for a TorusLife engine instance.
#[derive(Clone, Debug, Default)]
pub struct TorusLifeConfig {
    /// Number of threads for the row pool.
    /// `None` means rayon's default (one per logical CPU).
    pub thread_count: Option<usize>,
}

impl TorusLifeConfig {
    /// Set an explicit thread count for the row pool.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }
}

/// Whole-grid Life on a `rows x cols` torus with the ring's rule.
///
/// Neighbors are looked up directly with modular indexing, one generation
/// buffer in, one out; rows of the next generation are computed in parallel.
pub struct TorusLife {
    rows: usize,
    cols: usize,
    cells: [Vec<CellState>; 2],
    phase: usize,
    generation: u64,
    pool: rayon::ThreadPool,
}

impl TorusLife {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_config(rows, cols, TorusLifeConfig::default())
    }

    pub fn with_config(rows: usize, cols: usize, config: TorusLifeConfig) -> Self {
        assert!(rows > 0 && cols > 0, "torus must be non-empty");
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = config.thread_count {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .expect("failed to build TorusLife rayon thread pool");
        Self {
            rows,
            cols,
            cells: [
                vec![CellState::Dead; rows * cols],
                vec![CellState::Dead; rows * cols],
            ],
            phase: 0,
            generation: 0,
            pool,
        }
    }

    pub fn from_grid(grid: &GlobalGrid) -> Self {
        let mut engine = Self::new(grid.rows(), grid.cols());
        engine.cells[0].copy_from_slice(grid.states());
        engine
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_cell(&mut self, row: usize, col: usize, state: CellState) {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of range");
        self.cells[self.phase][row * self.cols + col] = state;
    }

    pub fn get_cell(&self, row: usize, col: usize) -> CellState {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of range");
        self.cells[self.phase][row * self.cols + col]
    }

    pub fn population(&self) -> u64 {
        self.cells[self.phase]
            .iter()
            .filter(|s| s.is_alive())
            .count() as u64
    }

    pub fn to_grid(&self) -> GlobalGrid {
        GlobalGrid::new(self.rows, self.cols, self.cells[self.phase].clone())
    }

    pub fn step(&mut self) {
        let rows = self.rows;
        let cols = self.cols;
        let (a, b) = self.cells.split_at_mut(1);
        let (current, next) = if self.phase == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        };

        self.pool.install(|| {
            next.par_chunks_mut(cols)
                .enumerate()
                .for_each(|(row, out)| advance_row(current, rows, cols, row, out));
        });

        self.phase ^= 1;
        self.generation += 1;
    }

    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }
}

fn advance_row(current: &[CellState], rows: usize, cols: usize, row: usize, out: &mut [CellState]) {
    let above = (row + rows - 1) % rows;
    let below = (row + 1) % rows;
    for (col, slot) in out.iter_mut().enumerate() {
        let left = (col + cols - 1) % cols;
        let right = (col + 1) % cols;
        // Skip by offset, not by coordinate: on a one-wide axis the
        // neighbor positions coincide with the cell itself.
        let mut alive = 0u8;
        for (dr, r) in [above, row, below].into_iter().enumerate() {
            for (dc, c) in [left, col, right].into_iter().enumerate() {
                if dr == 1 && dc == 1 {
                    continue;
                }
                alive += u8::from(current[r * cols + c].is_alive());
            }
        }
        *slot = next_state(current[row * cols + col], alive);
    }
}
