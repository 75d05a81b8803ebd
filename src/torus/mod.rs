//! Unpartitioned torus engine, used as the reference for the ring.

mod engine;

pub use engine::{TorusLife, TorusLifeConfig};
