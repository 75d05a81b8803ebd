//! Run configuration.

use std::num::NonZeroU64;
use std::time::Duration;

use super::error::ConfigError;
use super::partition::PartitionShape;
use super::seed::random_master_seed;

/// Overrides the default rank count when set.
pub const RANKS_ENV: &str = "RINGLIFE_RANKS";

const DEFAULT_DISPLAY_EVERY: u64 = 2;

/// Configuration for one ring run.
///
/// `RingLifeConfig::new(n, generations)` fills in defaults; adjust the rest
/// through the builder methods. Call [`validate`](Self::validate) (or let
/// `run_ring` do it) before starting.
#[derive(Clone, Debug)]
pub struct RingLifeConfig {
    /// Grid dimension; the run simulates about `n * n` cells.
    pub n: usize,
    /// Number of generations to run.
    pub generations: u64,
    /// Number of ranks in the ring.
    pub ranks: usize,
    /// Seed the per-rank seeds are derived from.
    pub master_seed: u64,
    /// Gather and render after every generation `g` with
    /// `g % display_every == 0`. `None` never displays.
    pub display_every: Option<u64>,
    /// Upper bound on any single receive. `None` waits forever.
    pub recv_timeout: Option<Duration>,
}

impl RingLifeConfig {
    pub fn new(n: usize, generations: u64) -> Self {
        Self {
            n,
            generations,
            ranks: default_rank_count(),
            master_seed: random_master_seed(),
            display_every: Some(DEFAULT_DISPLAY_EVERY),
            recv_timeout: None,
        }
    }

    pub fn ranks(mut self, ranks: usize) -> Self {
        self.ranks = ranks;
        self
    }

    pub fn master_seed(mut self, seed: u64) -> Self {
        self.master_seed = seed;
        self
    }

    pub fn display_every(mut self, every: Option<u64>) -> Self {
        self.display_every = every;
        self
    }

    pub fn recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Apply `RINGLIFE_RANKS` if it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(ranks) = ranks_from_env()? {
            self.ranks = ranks;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.ranks == 0 {
            return Err(ConfigError::ZeroRanks);
        }
        if self.display_every == Some(0) {
            return Err(ConfigError::ZeroDisplayInterval);
        }
        if self.n.checked_mul(self.n).is_none() {
            return Err(ConfigError::DimensionOverflow { n: self.n });
        }
        Ok(())
    }

    /// Per-rank partition shape. Only meaningful on a validated config.
    pub fn shape(&self) -> PartitionShape {
        PartitionShape::for_grid(self.n, self.ranks)
    }

    pub(crate) fn display_interval(&self) -> Option<NonZeroU64> {
        self.display_every.and_then(NonZeroU64::new)
    }
}

fn default_rank_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn ranks_from_env() -> Result<Option<usize>, ConfigError> {
    parse_ranks(std::env::var(RANKS_ENV).ok())
}

fn parse_ranks(raw: Option<String>) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<usize>() {
        Ok(ranks) if ranks > 0 => Ok(Some(ranks)),
        _ => Err(ConfigError::InvalidEnv {
            name: RANKS_ENV,
            value: raw,
        }),
    }
}
