//! Background catch-up example: one unloaded vessel advanced by an hour.
//!
//! Builds a small station with a CO2 scrubber, a coolant radiator and an
//! active radiation shield, runs a throwaway planner estimate, then catches
//! the station up in one large step and prints the resulting resources.
//! With `RUST_LOG=shipflow_core=trace` every resolved tick is logged.
//!
//! An optional argument names a RON, TOML or JSON file with a `SimConfig`.
//!
//! Run with: `cargo run -p shipflow-examples --example background_catchup`

use std::path::Path;

use shipflow_core::config::{SimConfig, load_config};
use shipflow_core::id::{PartId, VesselId};
use shipflow_core::library::{ResourceKind, ResourceLibrary, ResourceLibraryBuilder};
use shipflow_core::view::{PartContainer, VesselResources};
use shipflow_modules::{Planner, ProcessModule, RadiationEmitter, Radiator, VesselModule, VesselSimulator};
use tracing_subscriber::EnvFilter;

const STATION: VesselId = VesselId(42);
const CATCHUP_S: f64 = 3600.0;

fn library() -> ResourceLibrary {
    let mut builder = ResourceLibraryBuilder::new();
    for name in ["ElectricCharge", "Oxygen", "CarbonDioxide", "Coolant"] {
        builder.register(name, ResourceKind::Stored);
    }
    match builder.build() {
        Ok(library) => library,
        Err(err) => panic!("station library: {err}"),
    }
}

fn station() -> VesselResources {
    VesselResources::with_containers(
        STATION,
        vec![
            PartContainer::new(PartId(1), "ElectricCharge", 1500.0, 2000.0),
            PartContainer::new(PartId(2), "ElectricCharge", 500.0, 2000.0),
            PartContainer::new(PartId(3), "CarbonDioxide", 800.0, 1000.0),
            PartContainer::new(PartId(3), "Oxygen", 100.0, 1000.0),
            PartContainer::new(PartId(4), "Coolant", 0.0, 5000.0),
        ],
    )
}

fn modules() -> Vec<(PartId, Box<dyn VesselModule>)> {
    let scrubber = ProcessModule::new("Oxygen@0.1", "CarbonDioxide@0.1")
        .with_ec(0.0, 0.2)
        .with_title("scrubber");
    vec![
        (PartId(3), Box::new(scrubber) as Box<dyn VesselModule>),
        (PartId(4), Box::new(Radiator::default()) as Box<dyn VesselModule>),
        (PartId(5), Box::new(RadiationEmitter::new(-0.05, 0.4)) as Box<dyn VesselModule>),
    ]
}

fn config() -> SimConfig {
    let Some(path) = std::env::args().nth(1) else {
        return SimConfig::default();
    };
    match load_config(Path::new(&path)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{path}: {err}");
            std::process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();

    // --- Planner estimate on a copy of the station ---
    let mut planner = Planner::new(library(), config.clone(), station());
    for (part, module) in modules() {
        if let Err(err) = planner.add_module(part, module) {
            eprintln!("planner skipped a module: {err}");
        }
    }
    let estimate = planner.run(60);
    println!("planner estimate after {} s:", estimate.steps);
    for summary in &estimate.resources {
        let depletion = summary
            .depletion_time
            .map_or_else(|| "never".to_string(), |t| format!("{t:.0} s"));
        println!(
            "  {:<16} {:>8.2} / {:<8.0} {:>+8.3}/s  empty in {depletion}",
            summary.name, summary.amount, summary.capacity, summary.rate
        );
    }

    // --- Unloaded station caught up in one step ---
    let mut sim = VesselSimulator::new(library(), config);
    sim.attach(station());
    for (part, module) in modules() {
        if let Err(err) = sim.install(STATION, part, module) {
            eprintln!("station module disabled: {err}");
        }
    }

    tracing::info!(vessel = STATION.0, elapsed_s = CATCHUP_S, "catching up station");
    let report = sim.tick(STATION, CATCHUP_S);
    println!("\nafter {CATCHUP_S} s in the background:");
    for outcome in &report.recipes {
        println!("  recipe {:<16} ratio {:.3} limit {:?}", outcome.name, outcome.ratio, outcome.limit);
    }
    for (name, commit) in &report.commits {
        println!("  {name:<16} applied {:>+10.2}", commit.applied);
    }
    for discarded in &report.discarded {
        println!("  {:<16} discarded {:>+10.2}", discarded.resource, discarded.amount);
    }

    if let Some(view) = sim.engine().vessel_ref(STATION) {
        println!("\ncontainers:");
        for c in view.containers() {
            println!("  part {:>2} {:<16} {:>8.2} / {:.0}", c.part.0, c.resource, c.amount, c.capacity);
        }
    }

    sim.unload(STATION);
}
