//! Error types for the ring engine.

use std::fmt;

use thiserror::Error;

use super::comm::Tag;

/// Phase of a run in which a failure surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Startup,
    Exchange,
    Compute,
    Display,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Startup => "startup",
            Phase::Exchange => "exchange",
            Phase::Compute => "compute",
            Phase::Display => "display",
        };
        f.write_str(name)
    }
}

/// Invalid run parameters, rejected before any rank starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid dimension must be positive")]
    ZeroDimension,

    #[error("generation count must be positive")]
    ZeroGenerations,

    #[error("rank count must be positive")]
    ZeroRanks,

    #[error("display interval must be positive (use no display to disable it)")]
    ZeroDisplayInterval,

    #[error("grid dimension {n} is too large: n*n overflows")]
    DimensionOverflow { n: usize },

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Point-to-point messaging failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommError {
    #[error("rank {peer} is gone")]
    Disconnected { peer: usize },

    #[error("malformed message: expected {expected} cells, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("rank {rank} is outside a world of {size} ranks")]
    InvalidRank { rank: usize, size: usize },

    #[error("timed out waiting for {tag:?} from rank {peer}")]
    Timeout { peer: usize, tag: Tag },

    #[error("rank {peer} aborted the run")]
    Aborted { peer: usize },
}

#[derive(Debug, Error)]
pub enum RingLifeError {
    #[error("startup failed: {0}")]
    Config(#[from] ConfigError),

    #[error("{phase} failed on rank {rank} at generation {generation}: {source}")]
    Comm {
        rank: usize,
        generation: u64,
        phase: Phase,
        #[source]
        source: CommError,
    },

    #[error("startup failed: could not spawn rank {rank}: {source}")]
    Spawn {
        rank: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("compute failed: rank {rank} panicked")]
    RankPanicked { rank: usize },
}

impl RingLifeError {
    /// Phase the failure belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            RingLifeError::Config(_) | RingLifeError::Spawn { .. } => Phase::Startup,
            RingLifeError::Comm { phase, .. } => *phase,
            RingLifeError::RankPanicked { .. } => Phase::Compute,
        }
    }

    /// True when this rank only failed because another rank left first.
    pub fn caused_by_peer(&self) -> bool {
        matches!(
            self,
            RingLifeError::Comm {
                source: CommError::Aborted { .. } | CommError::Disconnected { .. },
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, RingLifeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_phase() {
        let err = RingLifeError::Comm {
            rank: 3,
            generation: 7,
            phase: Phase::Exchange,
            source: CommError::Disconnected { peer: 2 },
        };
        assert_eq!(
            err.to_string(),
            "exchange failed on rank 3 at generation 7: rank 2 is gone"
        );
        assert_eq!(err.phase(), Phase::Exchange);

        let err = RingLifeError::from(ConfigError::ZeroGenerations);
        assert!(err.to_string().starts_with("startup failed"));
        assert_eq!(err.phase(), Phase::Startup);

        let err = RingLifeError::RankPanicked { rank: 1 };
        assert_eq!(err.to_string(), "compute failed: rank 1 panicked");
        assert_eq!(err.phase(), Phase::Compute);
        assert!(!err.caused_by_peer());
    }
}
