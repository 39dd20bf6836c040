use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use traffic_flow::export;
use traffic_flow::simulation::{analyzer, NetworkConfig, SimulationEngine, DEFAULT_SEED};

#[derive(Parser)]
#[command(name = "traffic_flow")]
#[command(about = "Discrete-time road network traffic simulation")]
struct Cli {
    /// JSON network description; the built-in demo network is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(short, long, default_value = "60")]
    steps: u64,

    /// Time delta per tick in seconds
    #[arg(short, long, default_value = "1.0")]
    dt: f64,

    /// Density (vehicles/km) above which a road counts as congested
    #[arg(long, default_value = "30.0")]
    threshold: f64,

    /// Seed for the random inflows
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Directory to write history.csv and report.json into
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Print the network summary once the run is over
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NetworkConfig::load(path)?,
        None => {
            info!("No network file given, using the demo network");
            NetworkConfig::demo()
        }
    };

    let mut engine = SimulationEngine::from_config(&config, cli.seed)
        .context("Network description is invalid")?;

    info!("Ticks: {}, Delta: {}s", cli.steps, cli.dt);
    engine
        .run(cli.steps, cli.dt)
        .context("Simulation aborted")?;

    let history = engine.history();
    let report = analyzer::performance_report_with_threshold(history, cli.threshold);

    info!("=== SIMULATION COMPLETE ===");
    info!("Elapsed time: {:.1}s", engine.time());
    info!("Snapshots: {}", report.global.snapshot_count);
    info!("Initial vehicles: {}", engine.initial_vehicles());
    info!("Vehicles injected: {}", engine.injected_total());
    info!("Vehicles exited: {}", engine.exited_total());
    info!(
        "Active vehicles: {}",
        engine.current_network_state().total_vehicles()
    );
    info!("Mean speed: {:.2} m/s", report.mean_speed);
    info!("Mean congestion index: {:.1}", report.mean_congestion);
    info!(
        "Congestion frequency: {:.1}%",
        report.congestion_frequency * 100.0
    );
    info!("Efficiency: {:.1}%", report.efficiency);
    info!("Grade: {}", report.grade);
    for line in &report.recommendations {
        info!("  {}", line);
    }

    if cli.summary {
        engine.print_summary();
    }

    if let Some(dir) = &cli.export_dir {
        export::export_all(dir, history, &report)?;
    }

    Ok(())
}
