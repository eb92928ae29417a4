//! Offline progress report -- load a save, replay the absence, save again.
//!
//! Run with:
//!   cargo run --example offline_report -p farmstead-engine -- [SAVE_PATH] [OFFLINE_MINUTES]
//!
//! `SAVE_PATH` defaults to `farmstead-demo.json` in the temp directory.
//! `OFFLINE_MINUTES` simulates an extra absence on top of the real time since
//! the last save. Set `RUST_LOG=debug` to watch the workers.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use farmstead_engine::prelude::*;

const CATALOG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/catalog.json");

fn unix_now() -> Result<i64, anyhow::Error> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?
        .as_secs();
    i64::try_from(secs).context("system clock is out of range")
}

fn print_report(heading: &str, report: &AdvanceReport) {
    println!("{heading}: {}s replayed", report.elapsed.as_secs());
    println!(
        "  {} events, {} tasks assigned, {} tasks completed, {} entities removed",
        report.events_processed, report.tasks_assigned, report.tasks_completed, report.entities_removed
    );
    for (item, amount) in &report.harvested {
        println!("  harvested {amount} {item}");
    }
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let save_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("farmstead-demo.json"));
    let offline_minutes: i64 = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("offline minutes must be a whole number, got '{arg}'"))?,
        None => 0,
    };

    let catalog = StaticCatalog::from_json_file(CATALOG_PATH)
        .with_context(|| format!("failed to load catalog from {CATALOG_PATH}"))?;
    let mut store = JsonFileStore::new(&save_path);
    let now = unix_now()?;

    let (mut farm, outcome) = Farm::load_or_new(&store, catalog, now);
    match &outcome {
        LoadOutcome::Restored { report, repairs } => {
            for repair in repairs {
                println!("repaired: {repair}");
            }
            print_report("Welcome back", report);
        }
        LoadOutcome::Fresh => println!("New farm started at {}", save_path.display()),
        LoadOutcome::Recovered { error } => {
            println!("Save could not be loaded ({error}), new farm started");
        }
    }

    if offline_minutes > 0 {
        let report = farm.catch_up(offline_minutes.saturating_mul(60));
        print_report("Simulated absence", &report);
    }

    println!("Gold: {} (level {} equipment)", farm.gold(), farm.equipment_level());
    for (item, count) in farm.state().inventory.iter() {
        println!("  {item}: {count}");
    }
    for plot in farm.plots() {
        let entities = farm.entities_on_plot(plot.id).count();
        let worker = farm.workers().find(|w| w.targets(plot.id));
        match worker.and_then(|w| w.assigned_task.map(|task| (w.id, task))) {
            Some((id, task)) => println!("  {}: {entities} entities, {id} on {task}", plot.id),
            None => println!("  {}: {entities} entities", plot.id),
        }
    }
    if farm.has_won() {
        println!("Win condition reached!");
    }

    farm.save(&mut store, now)
        .with_context(|| format!("failed to save to {}", save_path.display()))?;
    Ok(())
}
