//! Conway's Game of Life on a torus, split into row bands across a ring of
//! ranks that trade boundary rows every generation.

pub mod ringlife;
pub mod torus;
pub use ringlife::{RankDriver, RingLifeConfig, RingRun, run_ring};
pub use torus::{TorusLife, TorusLifeConfig};
