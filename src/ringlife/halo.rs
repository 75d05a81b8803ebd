//! Halo exchange over the rank ring.
//!
//! Each generation a rank sends its top row up and its bottom row down, then
//! receives the up-neighbor's bottom row into `ghosts.top` and the
//! down-neighbor's top row into `ghosts.bottom`. Both sends are posted before
//! either receive; since [`Communicator::send`] never blocks, no rank can be
//! stuck sending while its neighbor is stuck sending too.
//!
//! A rank cannot finish the exchange for generation `g` until both neighbors
//! have posted their generation-`g` rows, so the exchange doubles as the
//! per-generation barrier.

use tracing::debug;

use super::cell::CellState;
use super::comm::{Communicator, RingTopology, Tag};
use super::error::CommError;
use super::neighbors::GhostRows;
use super::partition::LocalPartition;

/// Reusable send buffers for the boundary rows.
#[derive(Debug, Default)]
pub struct HaloBuffers {
    top: Vec<CellState>,
    bottom: Vec<CellState>,
}

impl HaloBuffers {
    pub fn new(cols: usize) -> Self {
        Self {
            top: Vec::with_capacity(cols),
            bottom: Vec::with_capacity(cols),
        }
    }

    /// Rows sent by the last exchange.
    pub fn sent(&self) -> (&[CellState], &[CellState]) {
        (&self.top, &self.bottom)
    }
}

/// Run one halo exchange for `partition`, filling `ghosts`.
pub fn exchange_halo<C: Communicator + ?Sized>(
    comm: &C,
    partition: &LocalPartition,
    buffers: &mut HaloBuffers,
    ghosts: &mut GhostRows,
) -> Result<(), CommError> {
    let ring = RingTopology::of(comm);
    debug_assert_eq!(ghosts.cols(), partition.cols());

    partition.copy_row_states(0, &mut buffers.top);
    partition.copy_row_states(partition.rows() - 1, &mut buffers.bottom);

    comm.send(ring.up(), Tag::TopRow, &buffers.top)?;
    comm.send(ring.down(), Tag::BottomRow, &buffers.bottom)?;

    comm.recv(ring.down(), Tag::TopRow, &mut ghosts.bottom)?;
    comm.recv(ring.up(), Tag::BottomRow, &mut ghosts.top)?;

    debug!(
        rank = ring.rank(),
        up = ring.up(),
        down = ring.down(),
        cols = partition.cols(),
        "halo exchanged"
    );
    Ok(())
}
