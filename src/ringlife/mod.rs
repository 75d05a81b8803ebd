//! Row-partitioned Life on a ring of ranks.

mod cell;
mod comm;
mod config;
mod display;
mod driver;
mod error;
mod halo;
mod launch;
mod neighbors;
mod partition;
mod seed;

pub use cell::{Cell, CellState, Neighborhood, next_state};
pub use comm::{AbortGuard, AbortHandle, ChannelComm, ChannelWorld, Communicator, RingTopology, Tag};
pub use config::{RANKS_ENV, RingLifeConfig};
pub use display::{GlobalGrid, GridDisplay, NullDisplay, ROOT, TextDisplay, gather_to_root};
pub use driver::{DriverState, GenerationTimings, RankDriver, RunStats};
pub use error::{CommError, ConfigError, Phase, Result, RingLifeError};
pub use halo::{HaloBuffers, exchange_halo};
pub use launch::{RingRun, run_partitions, run_ring};
pub use neighbors::{GhostRows, populate_diagonal, populate_neighbors, populate_orthogonal};
pub use partition::{LocalPartition, PartitionShape};
pub use seed::{distribute_seeds, random_master_seed};
