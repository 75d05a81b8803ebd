//! Per-rank generation driver.
//!
//! One generation walks `Idle -> Exchanging -> Computing -> (Displaying) ->
//! Idle`; after the requested number of generations the driver is `Done`.
//! The generation counter is owned by the driver and advanced only at the end
//! of `compute`, so the display cadence depends on nothing but the generation
//! index.

use std::num::NonZeroU64;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::cell::CellState;
use super::comm::Communicator;
use super::display::{GridDisplay, gather_to_root};
use super::error::{Phase, Result, RingLifeError};
use super::halo::{HaloBuffers, exchange_halo};
use super::neighbors::{GhostRows, populate_neighbors};
use super::partition::LocalPartition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Exchanging,
    Computing,
    Displaying,
    Done,
}

/// Wall-clock cost of one generation on one rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationTimings {
    pub exchange: Duration,
    pub compute: Duration,
    pub display: Duration,
    pub displayed: bool,
    /// Cells whose state flipped this generation.
    pub changed: usize,
}

/// Totals over a run on one rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub generations: u64,
    pub displays: u64,
    pub exchange: Duration,
    pub compute: Duration,
    pub display: Duration,
}

impl RunStats {
    fn record(&mut self, timings: &GenerationTimings) {
        self.generations += 1;
        self.displays += u64::from(timings.displayed);
        self.exchange += timings.exchange;
        self.compute += timings.compute;
        self.display += timings.display;
    }

    /// Exchange plus compute, display excluded.
    pub fn busy(&self) -> Duration {
        self.exchange + self.compute
    }

    pub fn average_generation(&self) -> Duration {
        if self.generations == 0 {
            return Duration::ZERO;
        }
        let nanos = self.busy().as_nanos() / u128::from(self.generations);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

pub struct RankDriver<C> {
    comm: C,
    partition: LocalPartition,
    ghosts: GhostRows,
    halo: HaloBuffers,
    generation: u64,
    state: DriverState,
    display_every: Option<NonZeroU64>,
}

impl<C: Communicator> RankDriver<C> {
    pub fn new(comm: C, partition: LocalPartition) -> Self {
        let cols = partition.cols();
        Self {
            comm,
            partition,
            ghosts: GhostRows::new(cols),
            halo: HaloBuffers::new(cols),
            generation: 0,
            state: DriverState::Idle,
            display_every: None,
        }
    }

    /// Gather and render after generation `g` when `g % every == 0`.
    pub fn display_every(mut self, every: Option<NonZeroU64>) -> Self {
        self.display_every = every;
        self
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Completed generations.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn partition(&self) -> &LocalPartition {
        &self.partition
    }

    pub fn ghosts(&self) -> &GhostRows {
        &self.ghosts
    }

    /// Top and bottom rows posted by the last exchange.
    pub fn sent_rows(&self) -> (&[CellState], &[CellState]) {
        self.halo.sent()
    }

    pub fn into_partition(self) -> LocalPartition {
        self.partition
    }

    fn comm_error(&self, phase: Phase, source: super::error::CommError) -> RingLifeError {
        RingLifeError::Comm {
            rank: self.comm.rank(),
            generation: self.generation,
            phase,
            source,
        }
    }

    /// Fill the ghost rows for the current generation.
    pub fn exchange(&mut self) -> Result<Duration> {
        assert_eq!(self.state, DriverState::Idle, "exchange outside Idle");
        self.state = DriverState::Exchanging;
        let start = Instant::now();
        if let Err(source) =
            exchange_halo(&self.comm, &self.partition, &mut self.halo, &mut self.ghosts)
        {
            return Err(self.comm_error(Phase::Exchange, source));
        }
        self.state = DriverState::Computing;
        Ok(start.elapsed())
    }

    /// Populate neighbors, apply the rule into the next buffer and swap.
    ///
    /// Returns the number of changed cells and the time taken.
    pub fn compute(&mut self) -> (usize, Duration) {
        assert_eq!(self.state, DriverState::Computing, "compute before exchange");
        let start = Instant::now();
        populate_neighbors(&mut self.partition, &self.ghosts);
        let changed = self.partition.advance();
        let index = self.generation;
        self.generation += 1;
        self.state = if self.displays_after(index) {
            DriverState::Displaying
        } else {
            DriverState::Idle
        };
        debug!(rank = self.rank(), generation = index, changed, "generation computed");
        (changed, start.elapsed())
    }

    fn displays_after(&self, generation_index: u64) -> bool {
        self.display_every
            .is_some_and(|every| generation_index % every.get() == 0)
    }

    /// Gather to the root and render there. Every rank must call this when
    /// its state is `Displaying`. Render failures are logged and skipped.
    pub fn display(&mut self, display: Option<&mut dyn GridDisplay>) -> Result<Duration> {
        assert_eq!(self.state, DriverState::Displaying, "display out of turn");
        let start = Instant::now();
        let gathered = match gather_to_root(&self.comm, &self.partition) {
            Ok(grid) => grid,
            Err(source) => return Err(self.comm_error(Phase::Display, source)),
        };
        if let (Some(grid), Some(display)) = (gathered, display) {
            let index = self.generation - 1;
            if let Err(err) = display.render(index, &grid) {
                warn!(generation = index, error = %err, "display skipped");
            }
        }
        self.state = DriverState::Idle;
        Ok(start.elapsed())
    }

    /// Run one full generation.
    pub fn step(&mut self, display: Option<&mut dyn GridDisplay>) -> Result<GenerationTimings> {
        let exchange = self.exchange()?;
        let (changed, compute) = self.compute();
        let mut timings = GenerationTimings {
            exchange,
            compute,
            changed,
            ..GenerationTimings::default()
        };
        if self.state == DriverState::Displaying {
            timings.display = self.display(display)?;
            timings.displayed = true;
        }
        Ok(timings)
    }

    /// Run exactly `generations` generations, then move to `Done`.
    pub fn run(
        &mut self,
        generations: u64,
        mut display: Option<&mut dyn GridDisplay>,
    ) -> Result<RunStats> {
        info!(rank = self.rank(), generations, "rank starting");
        let mut stats = RunStats::default();
        for _ in 0..generations {
            let frame = display.as_mut().map(|d| &mut **d as &mut dyn GridDisplay);
            let timings = self.step(frame)?;
            stats.record(&timings);
        }
        self.state = DriverState::Done;
        info!(
            rank = self.rank(),
            population = self.partition.population(),
            exchange_ms = stats.exchange.as_secs_f64() * 1000.0,
            compute_ms = stats.compute.as_secs_f64() * 1000.0,
            "rank finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ringlife::comm::ChannelWorld;
    use crate::ringlife::display::GlobalGrid;
    use crate::ringlife::partition::PartitionShape;
    use CellState::{Alive as A, Dead as D};

    struct Frames(Vec<u64>);

    impl GridDisplay for Frames {
        fn render(&mut self, generation: u64, _grid: &GlobalGrid) -> std::io::Result<()> {
            self.0.push(generation);
            Ok(())
        }
    }

    struct Broken;

    impl GridDisplay for Broken {
        fn render(&mut self, _generation: u64, _grid: &GlobalGrid) -> std::io::Result<()> {
            Err(std::io::Error::other("closed"))
        }
    }

    fn single_rank(states: &[CellState], shape: PartitionShape) -> RankDriver<crate::ringlife::comm::ChannelComm> {
        let comm = ChannelWorld::create(1, None).pop().unwrap();
        RankDriver::new(comm, LocalPartition::from_states(shape, states))
    }

    #[test]
    fn state_machine_walks_every_phase() {
        let mut driver = single_rank(&[A, D, D, D], PartitionShape::new(2, 2))
            .display_every(NonZeroU64::new(2));
        assert_eq!(driver.state(), DriverState::Idle);
        driver.exchange().unwrap();
        assert_eq!(driver.state(), DriverState::Computing);
        driver.compute();
        assert_eq!(driver.state(), DriverState::Displaying);
        driver.display(None).unwrap();
        assert_eq!(driver.state(), DriverState::Idle);
        driver.step(None).unwrap();
        assert_eq!(driver.state(), DriverState::Idle);
        driver.run(1, None).unwrap();
        assert_eq!(driver.state(), DriverState::Done);
        assert_eq!(driver.generation(), 3);
    }

    #[test]
    fn displays_every_other_generation() {
        let mut frames = Frames(Vec::new());
        let mut driver = single_rank(&[A; 9], PartitionShape::new(3, 3))
            .display_every(NonZeroU64::new(2));
        let stats = driver.run(7, Some(&mut frames)).unwrap();
        assert_eq!(frames.0, vec![0, 2, 4, 6]);
        assert_eq!(stats.generations, 7);
        assert_eq!(stats.displays, 4);
    }

    #[test]
    fn no_display_without_interval() {
        let mut frames = Frames(Vec::new());
        let mut driver = single_rank(&[A; 4], PartitionShape::new(2, 2));
        let stats = driver.run(5, Some(&mut frames)).unwrap();
        assert!(frames.0.is_empty());
        assert_eq!(stats.displays, 0);
    }

    #[test]
    fn render_failure_does_not_stop_the_run() {
        let mut broken = Broken;
        let mut driver = single_rank(&[A, A, D, D], PartitionShape::new(2, 2))
            .display_every(NonZeroU64::new(1));
        let stats = driver.run(3, Some(&mut broken)).unwrap();
        assert_eq!(stats.generations, 3);
    }

    #[test]
    fn one_by_one_torus_follows_its_own_state() {
        // The lone cell is all eight of its neighbors.
        let mut alive = single_rank(&[A], PartitionShape::new(1, 1));
        alive.step(None).unwrap();
        assert_eq!(alive.partition().cell(0, 0).state, D);

        let mut dead = single_rank(&[D], PartitionShape::new(1, 1));
        dead.step(None).unwrap();
        assert_eq!(dead.partition().get(0, 0), D);
    }

    #[test]
    #[should_panic(expected = "compute before exchange")]
    fn compute_requires_exchange() {
        let mut driver = single_rank(&[A], PartitionShape::new(1, 1));
        driver.compute();
    }
}
