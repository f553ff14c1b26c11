use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::error;

use traffic_microsim::scenario::Scenario;
use traffic_microsim::simulation::Simulation;

#[derive(Parser)]
#[command(name = "traffic_microsim")]
#[command(about = "Discrete-time traffic microsimulation")]
struct Cli {
    /// JSON scenario file; the built-in demo world is used when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Seed for intersection routing; seeded from the OS when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of simulation steps
    #[arg(long, default_value = "10000")]
    max_steps: u64,

    /// Print a state report every N steps (0 disables reports)
    #[arg(long, default_value = "60")]
    report_every: u64,

    /// Also draw every road as an ASCII strip with each report
    #[arg(long)]
    map: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_simulation(cli: &Cli) -> Result<Simulation> {
    match &cli.scenario {
        Some(path) => Scenario::from_file(path)?.build(cli.seed),
        None => match cli.seed {
            Some(seed) => Simulation::create_demo_world_with_seed(seed),
            None => Simulation::create_demo_world(),
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut sim = load_simulation(cli)?;

    println!("Initial state:");
    print_report(&sim, cli.map);

    let report_every = cli.report_every;
    let map = cli.map;
    sim.run(Some(cli.max_steps), |sim| {
        if report_every > 0 && sim.step_count % report_every == 0 {
            print_report(sim, map);
        }
    })?;

    println!("=== Final State ===");
    print_report(&sim, cli.map);
    sim.log_summary();

    Ok(())
}

fn print_report(sim: &Simulation, map: bool) {
    let snapshot = sim.snapshot();
    println!("{}", snapshot);
    if map {
        println!("{}", snapshot.render_map(80));
    }
}
