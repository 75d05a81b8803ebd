//! Root-side gather and rendering of the global grid.

use std::fmt;
use std::io::{self, Write};

use super::cell::CellState;
use super::comm::{Communicator, Tag};
use super::error::CommError;
use super::partition::LocalPartition;

pub const ROOT: usize = 0;

/// The full torus, rank bands stacked in rank order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalGrid {
    rows: usize,
    cols: usize,
    states: Vec<CellState>,
}

impl GlobalGrid {
    pub fn new(rows: usize, cols: usize, states: Vec<CellState>) -> Self {
        assert_eq!(states.len(), rows * cols, "grid state count mismatch");
        Self { rows, cols, states }
    }

    /// Stack partitions in slice order. All must share one shape.
    pub fn from_partitions(partitions: &[LocalPartition]) -> Self {
        let first = partitions
            .first()
            .expect("at least one partition is required");
        let shape = first.shape();
        let mut states = Vec::with_capacity(shape.cell_count() * partitions.len());
        for partition in partitions {
            assert_eq!(partition.shape(), shape, "partition shapes differ");
            states.extend(partition.states());
        }
        Self::new(shape.rows * partitions.len(), shape.cols, states)
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
    pub fn get(&self, row: usize, col: usize) -> CellState {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of range");
        self.states[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[CellState] {
        &self.states[row * self.cols..(row + 1) * self.cols]
    }

    pub fn states(&self) -> &[CellState] {
        &self.states
    }

    pub fn cell_count(&self) -> usize {
        self.states.len()
    }

    pub fn population(&self) -> u64 {
        self.states.iter().filter(|s| s.is_alive()).count() as u64
    }
}

impl fmt::Display for GlobalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for (col, state) in self.row(row).iter().enumerate() {
                if col > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", state.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Collect every rank's partition at [`ROOT`].
///
/// Collective: every rank must call it for the same generation. Returns the
/// assembled grid on the root and `None` elsewhere.
pub fn gather_to_root<C: Communicator + ?Sized>(
    comm: &C,
    partition: &LocalPartition,
) -> Result<Option<GlobalGrid>, CommError> {
    if comm.rank() != ROOT {
        comm.send(ROOT, Tag::Gather, &partition.states())?;
        return Ok(None);
    }

    let shape = partition.shape();
    let band = shape.cell_count();
    let mut states = vec![CellState::Dead; band * comm.size()];
    states[..band].copy_from_slice(&partition.states());
    for source in 1..comm.size() {
        comm.recv(source, Tag::Gather, &mut states[source * band..(source + 1) * band])?;
    }
    Ok(Some(GlobalGrid::new(shape.rows * comm.size(), shape.cols, states)))
}

/// Consumer of gathered grids. Only the root rank renders.
pub trait GridDisplay: Send {
    fn render(&mut self, generation: u64, grid: &GlobalGrid) -> io::Result<()>;
}

/// Discards every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl GridDisplay for NullDisplay {
    fn render(&mut self, _generation: u64, _grid: &GlobalGrid) -> io::Result<()> {
        Ok(())
    }
}

/// Prints `A`/`D` rows followed by a blank line.
pub struct TextDisplay<W> {
    out: W,
}

impl<W: Write + Send> TextDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TextDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> GridDisplay for TextDisplay<W> {
    fn render(&mut self, _generation: u64, grid: &GlobalGrid) -> io::Result<()> {
        write!(self.out, "{grid}")?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ringlife::comm::ChannelWorld;
    use crate::ringlife::partition::PartitionShape;
    use CellState::{Alive as A, Dead as D};

    #[test]
    fn text_display_prints_symbol_rows() {
        let grid = GlobalGrid::new(2, 3, vec![A, D, A, D, D, A]);
        let mut display = TextDisplay::new(Vec::new());
        display.render(0, &grid).unwrap();
        let text = String::from_utf8(display.into_inner()).unwrap();
        assert_eq!(text, "A D A\nD D A\n\n");
    }

    #[test]
    fn gather_stacks_bands_in_rank_order() {
        let world = ChannelWorld::create(3, Some(std::time::Duration::from_secs(5)));
        let shape = PartitionShape::new(1, 2);
        let bands = [[A, A], [D, A], [D, D]];

        let grids: Vec<Option<GlobalGrid>> = std::thread::scope(|s| {
            let handles: Vec<_> = world
                .into_iter()
                .zip(bands)
                .map(|(comm, band)| {
                    s.spawn(move || {
                        let partition = LocalPartition::from_states(shape, &band);
                        gather_to_root(&comm, &partition).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let root = grids[0].as_ref().expect("root holds the grid");
        assert_eq!(root.rows(), 3);
        assert_eq!(root.states(), &[A, A, D, A, D, D]);
        assert!(grids[1].is_none());
        assert!(grids[2].is_none());
    }
}
