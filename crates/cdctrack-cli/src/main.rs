//! cdctrack CLI — simulate drift chamber events and run the track finder.

use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use cdctrack::eventdata::EventRecord;
use cdctrack::geometry::Helix;
use cdctrack::sim::{simulate_track, SimConfig};
use cdctrack::topology::{CdcLayout, LayoutSpec};
use cdctrack::{TrackFinder, TrackingConfig, TrackingResult};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "cdctrack")]
#[command(about = "Track pattern recognition in a central drift chamber (Legendre search, cellular automaton, helix fusion)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate simulated events (JSON).
    Simulate(SimulateArgs),

    /// Run the track finder over events from a JSON file.
    Find(FindArgs),

    /// Print the wire layout summary.
    LayoutInfo,
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    /// Path to write the simulated events (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Number of events to generate.
    #[arg(long, default_value = "10")]
    n_events: usize,

    /// Tracks per event.
    #[arg(long, default_value = "3")]
    n_tracks: usize,

    /// Gaussian drift smearing in cm.
    #[arg(long, default_value = "0.015")]
    drift_noise: f64,

    /// Random seed.
    #[arg(long, default_value = "1")]
    seed: u64,
}

#[derive(Debug, Clone, Args)]
struct FindArgs {
    /// Path to the input events (JSON, as written by `simulate`).
    #[arg(long)]
    input: PathBuf,

    /// Path to write the per-event tracking results (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Optional finder configuration (JSON, partial documents allowed).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventFile {
    events: Vec<EventRecord>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => run_simulate(&args),
        Commands::Find(args) => run_find(&args),
        Commands::LayoutInfo => run_layout_info(),
    }
}

// ── simulate ──────────────────────────────────────────────────────────

fn run_simulate(args: &SimulateArgs) -> CliResult<()> {
    let layout = CdcLayout::default();
    let sim_config = SimConfig {
        drift_noise: args.drift_noise,
        ..SimConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut events = Vec::with_capacity(args.n_events);
    for _ in 0..args.n_events {
        let mut hits = Vec::new();
        for particle in 0..args.n_tracks as u32 {
            let helix = random_helix(&mut rng);
            hits.extend(simulate_track(&helix, particle, &layout, &sim_config, &mut rng));
        }
        events.push(EventRecord { hits });
    }

    let writer = BufWriter::new(File::create(&args.out)?);
    serde_json::to_writer_pretty(writer, &EventFile { events })?;
    tracing::info!("Events written to {}", args.out.display());
    Ok(())
}

fn random_helix(rng: &mut StdRng) -> Helix {
    Helix::new(
        rng.gen_range(-0.02..0.02),
        rng.gen_range(0.0..std::f64::consts::TAU),
        rng.gen_range(-0.3..0.3),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-2.0..2.0),
    )
}

// ── find ──────────────────────────────────────────────────────────────

fn run_find(args: &FindArgs) -> CliResult<()> {
    let config: TrackingConfig = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => TrackingConfig::default(),
    };
    let finder = TrackFinder::new(CdcLayout::default(), config)?;

    let file: EventFile = serde_json::from_reader(BufReader::new(File::open(&args.input)?))?;
    tracing::info!("Loaded {} events from {}", file.events.len(), args.input.display());

    let results: Vec<TrackingResult> = file
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let result = finder.process(event);
            tracing::info!(
                event = i,
                n_hits = result.n_hits,
                n_tracks = result.tracks.len(),
                "event processed"
            );
            result
        })
        .collect();

    let writer = BufWriter::new(File::create(&args.out)?);
    serde_json::to_writer_pretty(writer, &results)?;
    tracing::info!("Results written to {}", args.out.display());
    Ok(())
}

// ── layout-info ───────────────────────────────────────────────────────

fn run_layout_info() -> CliResult<()> {
    let spec = LayoutSpec::default();
    let layout = CdcLayout::new(spec.clone());

    println!("cdctrack default wire layout");
    println!("  super-layers:     {}", layout.n_superlayers());
    println!("  total layers:     {}", layout.n_layers_total());
    for (isl, sl) in spec.superlayers.iter().enumerate() {
        println!(
            "  SL{}: {:?}, {} layers, r = {:.1} cm, {} wires/layer",
            isl, sl.kind, sl.n_layers, sl.inner_radius, sl.n_wires
        );
    }
    Ok(())
}
