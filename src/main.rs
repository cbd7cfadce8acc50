//! Headless simulation runner
//!
//! Runs a seeded infection scenario for a fixed number of ticks, then
//! writes the population time series as CSV and a final JSON snapshot.
//!
//! Usage: hemosim [seed] [ticks] [csv-path]

use std::error::Error;
use std::path::PathBuf;

use hemosim::consts::SIM_DT;
use hemosim::sim::AgentKind;
use hemosim::{SimConfig, Simulation, export};

struct Args {
    seed: u64,
    ticks: u64,
    csv_path: PathBuf,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse()?,
        None => 42,
    };
    let ticks = match args.next() {
        Some(s) => s.parse()?,
        None => 3600,
    };
    let csv_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("simulation.csv"));
    Ok(Args {
        seed,
        ticks,
        csv_path,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = parse_args()?;

    let config = SimConfig::with_seed(args.seed);
    let mut sim = Simulation::new(config)?;

    // Seed an infection near the center of the arena.
    let w = sim.state().world_size();
    for _ in 0..3 {
        sim.spawn(AgentKind::Pathogen, w / 2.0, w / 2.0);
    }
    sim.play();

    for tick in 0..args.ticks {
        sim.advance(SIM_DT);
        if tick % 600 == 0 {
            let counts = sim.state().populations.counts();
            log::info!(
                "t={:.1}s pathogens={} antibodies={} memory={}",
                sim.state().time,
                counts.pathogens,
                counts.antibodies,
                sim.state().immune_memory
            );
        }
    }

    export::write_metrics_csv(&args.csv_path, sim.metrics())?;

    let snapshot_path = args.csv_path.with_extension("json");
    let snapshot = sim.snapshot();
    std::fs::write(&snapshot_path, serde_json::to_string_pretty(&snapshot)?)?;
    log::info!("wrote final snapshot to {}", snapshot_path.display());

    let counts = sim.state().populations.counts();
    println!(
        "ran {} ticks: {} pathogens, {} red cells, memory acquired: {}",
        sim.state().time_ticks,
        counts.pathogens,
        counts.red_cells,
        sim.state().immune_memory
    );
    Ok(())
}
