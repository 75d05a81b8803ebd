//! Neighbor-count engine.
//!
//! Populates every cell's [`Neighborhood`](super::cell::Neighborhood) in two
//! passes over the whole partition:
//!
//! 1. vertical + horizontal: `up`/`down` from the adjacent local row or the
//!    ghost rows at the partition edges, `left`/`right` from the same row with
//!    column wrap-around;
//! 2. diagonal: `up_left` is the left neighbor's `up`, and so on.
//!
//! Pass 2 reads fields written by pass 1 for *other* cells, so pass 1 must
//! finish for the entire partition first.

use super::cell::CellState;
use super::partition::LocalPartition;

/// Boundary rows received from the ring neighbors for one generation.
///
/// `top` is the up-neighbor's bottom row, `bottom` the down-neighbor's top row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostRows {
    pub top: Vec<CellState>,
    pub bottom: Vec<CellState>,
}

impl GhostRows {
    pub fn new(cols: usize) -> Self {
        Self {
            top: vec![CellState::Dead; cols],
            bottom: vec![CellState::Dead; cols],
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.top.len()
    }
}

#[inline]
fn wrap_left(col: usize, cols: usize) -> usize {
    if col == 0 { cols - 1 } else { col - 1 }
}

#[inline]
fn wrap_right(col: usize, cols: usize) -> usize {
    if col + 1 == cols { 0 } else { col + 1 }
}

/// Pass 1: `up`, `down`, `left`, `right` for every cell.
pub fn populate_orthogonal(partition: &mut LocalPartition, ghosts: &GhostRows) {
    let rows = partition.rows();
    let cols = partition.cols();
    assert_eq!(ghosts.top.len(), cols, "top ghost row has wrong length");
    assert_eq!(ghosts.bottom.len(), cols, "bottom ghost row has wrong length");

    let cells = partition.current_mut();
    for row in 0..rows {
        for col in 0..cols {
            let up = if row == 0 {
                ghosts.top[col]
            } else {
                cells[(row - 1) * cols + col].state
            };
            let down = if row == rows - 1 {
                ghosts.bottom[col]
            } else {
                cells[(row + 1) * cols + col].state
            };
            let left = cells[row * cols + wrap_left(col, cols)].state;
            let right = cells[row * cols + wrap_right(col, cols)].state;

            let hood = &mut cells[row * cols + col].neighbors;
            hood.up = up;
            hood.down = down;
            hood.left = left;
            hood.right = right;
        }
    }
}

/// Pass 2: diagonals, derived from the vertical fields of the left and right
/// neighbors.
pub fn populate_diagonal(partition: &mut LocalPartition) {
    let rows = partition.rows();
    let cols = partition.cols();
    let cells = partition.current_mut();
    for row in 0..rows {
        let base = row * cols;
        for col in 0..cols {
            let left = cells[base + wrap_left(col, cols)].neighbors;
            let right = cells[base + wrap_right(col, cols)].neighbors;

            let hood = &mut cells[base + col].neighbors;
            hood.up_left = left.up;
            hood.up_right = right.up;
            hood.down_left = left.down;
            hood.down_right = right.down;
        }
    }
}

/// Run both passes in order.
pub fn populate_neighbors(partition: &mut LocalPartition, ghosts: &GhostRows) {
    populate_orthogonal(partition, ghosts);
    populate_diagonal(partition);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ringlife::cell::{CellState, Neighborhood};
    use crate::ringlife::partition::PartitionShape;
    use CellState::{Alive as A, Dead as D};

    #[test]
    fn single_cell_sees_itself_everywhere() {
        for state in [A, D] {
            let mut partition = LocalPartition::from_states(PartitionShape::new(1, 1), &[state]);
            let ghosts = GhostRows {
                top: vec![state],
                bottom: vec![state],
            };
            populate_neighbors(&mut partition, &ghosts);
            assert_eq!(partition.cell(0, 0).neighbors, Neighborhood::uniform(state));
        }
    }

    #[test]
    fn edge_rows_read_ghosts() {
        let mut partition = LocalPartition::new(PartitionShape::new(2, 3));
        let ghosts = GhostRows {
            top: vec![A, D, D],
            bottom: vec![D, D, A],
        };
        populate_neighbors(&mut partition, &ghosts);

        assert_eq!(partition.cell(0, 0).neighbors.up, A);
        assert_eq!(partition.cell(0, 1).neighbors.up_left, A);
        assert_eq!(partition.cell(0, 2).neighbors.up_right, A);
        assert_eq!(partition.cell(1, 2).neighbors.down, A);
        assert_eq!(partition.cell(1, 0).neighbors.down_left, A);
        assert_eq!(partition.cell(1, 1).neighbors.down_right, A);
        assert_eq!(partition.cell(1, 0).neighbors.up, D);
    }

    #[test]
    fn single_row_uses_both_ghosts() {
        let mut partition = LocalPartition::from_states(PartitionShape::new(1, 3), &[D, A, D]);
        let ghosts = GhostRows {
            top: vec![A, A, A],
            bottom: vec![D, D, D],
        };
        populate_neighbors(&mut partition, &ghosts);
        let hood = partition.cell(0, 0).neighbors;
        assert_eq!(hood.up, A);
        assert_eq!(hood.down, D);
        assert_eq!(hood.right, A);
        assert_eq!(hood.left, D);
        assert_eq!(hood.alive_count(), 4);
    }

    #[test]
    fn counts_match_direct_lookup_on_interior() {
        // 3x3 partition, ghosts all dead, center alive only on the diagonal.
        let states = [A, D, D, D, A, D, D, D, A];
        let mut partition = LocalPartition::from_states(PartitionShape::new(3, 3), &states);
        populate_neighbors(&mut partition, &GhostRows::new(3));
        let center = partition.cell(1, 1).neighbors;
        assert_eq!(center.up_left, A);
        assert_eq!(center.down_right, A);
        assert_eq!(center.alive_count(), 2);
    }
}
