//! In-process ring: one OS thread per rank.
//!
//! Ranks block on their halo receives, so each gets a dedicated thread rather
//! than a slot in a work-stealing pool. A rank that returns an error or panics
//! aborts its peers, so a failure ends the whole run.

use std::num::NonZeroU64;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info};

use super::comm::ChannelWorld;
use super::config::RingLifeConfig;
use super::display::{GlobalGrid, GridDisplay};
use super::driver::{RankDriver, RunStats};
use super::error::{Result, RingLifeError};
use super::partition::{LocalPartition, PartitionShape};
use super::seed::distribute_seeds;

/// Outcome of a finished ring run.
#[derive(Clone, Debug)]
pub struct RingRun {
    /// Final generation, rank bands stacked in rank order.
    pub grid: GlobalGrid,
    pub shape: PartitionShape,
    /// Per-rank totals, indexed by rank.
    pub stats: Vec<RunStats>,
    pub elapsed: Duration,
}

impl RingRun {
    /// Slowest rank's exchange time.
    pub fn exchange_time(&self) -> Duration {
        self.stats.iter().map(|s| s.exchange).max().unwrap_or_default()
    }

    /// Slowest rank's compute time.
    pub fn compute_time(&self) -> Duration {
        self.stats.iter().map(|s| s.compute).max().unwrap_or_default()
    }

    /// Slowest rank's mean exchange-plus-compute time per generation.
    pub fn average_generation(&self) -> Duration {
        self.stats
            .iter()
            .map(RunStats::average_generation)
            .max()
            .unwrap_or_default()
    }

    /// Time the root spent gathering and rendering.
    pub fn display_time(&self) -> Duration {
        self.stats.first().map(|s| s.display).unwrap_or_default()
    }
}

/// Validate `config`, seed one partition per rank and run the ring.
///
/// `display` renders on rank 0 only.
pub fn run_ring(config: &RingLifeConfig, display: Option<&mut dyn GridDisplay>) -> Result<RingRun> {
    config.validate()?;
    let shape = config.shape();
    info!(
        n = config.n,
        ranks = config.ranks,
        rows = shape.rows,
        cols = shape.cols,
        generations = config.generations,
        master_seed = config.master_seed,
        "starting ring"
    );
    let partitions = distribute_seeds(config.master_seed, config.ranks)
        .into_iter()
        .map(|seed| LocalPartition::from_seed(shape, seed))
        .collect();
    run_partitions(
        partitions,
        config.generations,
        config.display_interval(),
        config.recv_timeout,
        display,
    )
}

/// Run the ring over explicit partitions, one rank per partition in order.
pub fn run_partitions(
    partitions: Vec<LocalPartition>,
    generations: u64,
    display_every: Option<NonZeroU64>,
    recv_timeout: Option<Duration>,
    mut display: Option<&mut dyn GridDisplay>,
) -> Result<RingRun> {
    assert!(!partitions.is_empty(), "a ring needs at least one rank");
    let shape = partitions[0].shape();
    assert!(
        partitions.iter().all(|p| p.shape() == shape),
        "every rank must hold the same partition shape"
    );

    let start = Instant::now();
    let world = ChannelWorld::create(partitions.len(), recv_timeout);

    let outcomes = thread::scope(|s| {
        let mut handles = Vec::with_capacity(partitions.len());
        for (rank, (comm, partition)) in world.into_iter().zip(partitions).enumerate() {
            let rank_display = if rank == 0 { display.take() } else { None };
            let abort = comm.abort_handle();
            let guard = abort.clone().guard();
            let spawned = thread::Builder::new()
                .name(format!("rank-{rank}"))
                .spawn_scoped(s, move || -> Result<(RunStats, LocalPartition)> {
                    let mut driver = RankDriver::new(comm, partition).display_every(display_every);
                    let stats = driver.run(generations, rank_display)?;
                    guard.disarm();
                    Ok((stats, driver.into_partition()))
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    // Joined here so a panicking rank does not re-panic the scope.
                    abort.abort();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return vec![Err(RingLifeError::Spawn { rank, source })];
                }
            }
        }
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(RingLifeError::RankPanicked { rank }))
            })
            .collect::<Vec<Result<(RunStats, LocalPartition)>>>()
    });

    let mut stats = Vec::with_capacity(outcomes.len());
    let mut finals = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok((rank_stats, partition)) => {
                stats.push(rank_stats);
                finals.push(partition);
            }
            Err(err) => errors.push(err),
        }
    }
    if let Some(err) = first_cause(errors) {
        error!(phase = %err.phase(), error = %err, "ring run failed");
        return Err(err);
    }

    let run = RingRun {
        grid: GlobalGrid::from_partitions(&finals),
        shape,
        stats,
        elapsed: start.elapsed(),
    };
    info!(
        population = run.grid.population(),
        elapsed_ms = run.elapsed.as_secs_f64() * 1000.0,
        "ring finished"
    );
    Ok(run)
}

/// The failure that started the abort, not one of the ranks it woke.
fn first_cause(errors: Vec<RingLifeError>) -> Option<RingLifeError> {
    let pos = errors.iter().position(|err| !err.caused_by_peer()).unwrap_or(0);
    errors.into_iter().nth(pos)
}
