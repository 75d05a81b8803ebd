#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use ring_life::ringlife::{
    ConfigError, GlobalGrid, LocalPartition, RingLifeConfig, TextDisplay, distribute_seeds,
    run_ring,
};
use ring_life::torus::TorusLife;

#[derive(Parser, Debug)]
#[command(name = "ring-life")]
#[command(version)]
#[command(about = "Game of Life on a torus, row-partitioned over a ring of ranks", long_about = None)]
struct Args {
    /// Grid dimension (about n*n cells in total)
    n: usize,

    /// Number of generations
    generations: u64,

    /// Number of ranks (defaults to $RINGLIFE_RANKS, then the CPU count)
    #[arg(short = 'p', long)]
    ranks: Option<usize>,

    /// Master seed for the per-rank seeds (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the grid after every K-th generation
    #[arg(long, default_value = "2")]
    display_every: u64,

    /// Never print the grid
    #[arg(long)]
    no_display: bool,

    /// Replay the run on an unpartitioned torus and compare the final grids
    #[arg(long)]
    check: bool,

    /// Fail a rank that waits longer than this many milliseconds on a message
    #[arg(long)]
    recv_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

fn build_config(args: &Args) -> Result<RingLifeConfig, ConfigError> {
    let mut config = RingLifeConfig::new(args.n, args.generations).with_env_overrides()?;
    if let Some(ranks) = args.ranks {
        config = config.ranks(ranks);
    }
    if let Some(seed) = args.seed {
        config = config.master_seed(seed);
    }
    let display_every = (!args.no_display).then_some(args.display_every);
    Ok(config
        .display_every(display_every)
        .recv_timeout(args.recv_timeout_ms.map(Duration::from_millis)))
}

fn reference_grid(config: &RingLifeConfig) -> GlobalGrid {
    let shape = config.shape();
    let partitions: Vec<LocalPartition> = distribute_seeds(config.master_seed, config.ranks)
        .into_iter()
        .map(|seed| LocalPartition::from_seed(shape, seed))
        .collect();
    let mut torus = TorusLife::from_grid(&GlobalGrid::from_partitions(&partitions));
    torus.step_n(config.generations);
    torus.to_grid()
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            eprintln!("ring-life: startup failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut display = TextDisplay::stdout();
    let run = match run_ring(&config, Some(&mut display)) {
        Ok(run) => run,
        Err(err) => {
            error!(phase = %err.phase(), %err, "ring run failed");
            eprintln!("ring-life: {err}");
            return ExitCode::FAILURE;
        }
    };

    let generations = config.generations;
    let avg_ms = ms(run.average_generation());
    let total_ms = ms(run.elapsed.saturating_sub(run.display_time()));

    println!("\n--- Summary ({generations} generations, {} ranks) ---", config.ranks);
    println!(
        "Grid: {}x{} ({}x{} per rank), population {}",
        run.grid.rows(),
        run.grid.cols(),
        run.shape.rows,
        run.shape.cols,
        run.grid.population()
    );
    println!("Avg generation runtime: {avg_ms:.3} ms");
    println!("Total runtime: {total_ms:.3} ms");
    println!("Total communication time: {:.3} ms", ms(run.exchange_time()));
    println!("Total computation time: {:.3} ms", ms(run.compute_time()));

    if args.check {
        let expected = reference_grid(&config);
        let status = if expected == run.grid {
            "MATCH"
        } else {
            "MISMATCH"
        };
        println!(
            "Reference torus pop = {}, ring pop = {} [{status}]",
            expected.population(),
            run.grid.population()
        );
        info!(status, "reference check finished");
        if expected != run.grid {
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
