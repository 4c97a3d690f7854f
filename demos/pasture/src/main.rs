//! pasture: sheep and wolves on a shared pasture.
//!
//! Sheep use a prioritised rule set (breed, graze); wolves use a finite
//! state machine (roaming, hunting).  The model runs once with CSV output
//! and then as independent replicates, in parallel, from derived seeds.
//!
//! ```text
//! cargo run -p pasture -- [sim.toml] [output-dir]
//! RUST_LOG=abm_sim=debug cargo run -p pasture
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use abm_agent::{Population, PopulationBuilder};
use abm_behavior::{Architecture, Condition, Model, Rule, State, action, when};
use abm_core::{Bindings, Value};
use abm_output::{CsvWriter, SimOutputObserver};
use abm_sim::{SimBuilder, SimConfig, replicate_seeds, run_replicates};

// ── Constants ─────────────────────────────────────────────────────────────────

const SHEEP:      usize = 40;
const WOLVES:     usize = 6;
const REPLICATES: u32   = 8;

const DEFAULT_CONFIG: &str = include_str!("../sim.toml");

// ── Model ─────────────────────────────────────────────────────────────────────

fn energy(n: i64) -> Bindings {
    [("energy".to_owned(), Value::Int(n))].into()
}

fn sheep() -> Architecture {
    Architecture::rules(vec![
        Rule::new(
            "breed",
            when(|ctx| Ok(ctx.attr("energy").and_then(Value::as_int).unwrap_or(0) >= 8)),
            action(|ctx| {
                ctx.add_attr("energy", -4)?;
                ctx.spawn("sheep", energy(3));
                Ok(())
            }),
        )
        .priority(2),
        Rule::new(
            "graze",
            Condition::always(),
            action(|ctx| {
                let grass = ctx.global("grass_chance").and_then(Value::as_float).unwrap_or(0.5);
                let gain = if ctx.rng.next_bool(grass) { 2 } else { -1 };
                if ctx.add_attr("energy", gain)? <= 0 {
                    ctx.die();
                }
                Ok(())
            }),
        ),
    ])
}

fn wolf() -> Architecture {
    let hungry = when(|ctx| Ok(ctx.attr("energy").and_then(Value::as_int).unwrap_or(0) < 5));
    let fed = when(|ctx| Ok(ctx.attr("energy").and_then(Value::as_int).unwrap_or(0) >= 10));

    Architecture::fsm(vec![
        State::new("roaming")
            .initial()
            .body(action(|ctx| {
                ctx.add_attr("energy", -1)?;
                Ok(())
            }))
            .transition("hunting", hungry),
        State::new("hunting")
            .on_enter(action(|ctx| {
                ctx.declare("attempts", 0);
                Ok(())
            }))
            .body(action(|ctx| {
                let attempts = ctx.get_int("attempts").unwrap_or(0) + 1;
                ctx.set("attempts", attempts);
                let catch = ctx.global("catch_chance").and_then(Value::as_float).unwrap_or(0.3);
                let gain = if ctx.rng.next_bool(catch) {
                    ctx.add_attr("kills", 1)?;
                    6
                } else {
                    -1
                };
                if ctx.add_attr("energy", gain)? <= 0 {
                    ctx.die();
                }
                Ok(())
            }))
            .transition("roaming", fed),
    ])
    .on_init(action(|ctx| {
        ctx.set_attr("kills", 0);
        Ok(())
    }))
}

fn model() -> Model {
    Model::new("pasture")
        .species("sheep", sheep())
        .species("wolf", wolf())
        .global("grass_chance", 0.55)
        .global("catch_chance", 0.3)
}

fn population() -> Population {
    let (population, _) = PopulationBuilder::new()
        .spawn("sheep", SHEEP, |i| energy(4 + (i % 4) as i64))
        .spawn("wolf", WOLVES, |_| energy(12))
        .build();
    population
}

// ── main ──────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(path: Option<&str>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::from_toml_path(path).with_context(|| format!("loading {path}")),
        None => Ok(SimConfig::from_toml_str(DEFAULT_CONFIG)?),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let out_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("output/pasture"));
    let model = Arc::new(model());

    println!("=== pasture (rust_abm) ===");
    println!("Sheep: {SHEEP}  |  Wolves: {WOLVES}  |  Cycles: {}", config.total_ticks);

    // 1. One run with CSV output.
    let t0 = Instant::now();
    let mut sim = SimBuilder::new(config.clone(), Arc::clone(&model))
        .population(population())
        .build()?;
    let writer = CsvWriter::new(&out_dir)?;
    let mut obs = SimOutputObserver::new(writer, &sim.config);
    sim.run_to_end(&mut obs)?;
    if let Some(e) = obs.take_error() {
        eprintln!("output error: {e}");
    }

    let snapshot = sim.snapshot();
    let count = |species: &str| snapshot.agents.iter().filter(|a| a.species == species).count();
    println!(
        "Seed {}: {} sheep, {} wolves after {} in {:.2?}",
        sim.seed(),
        count("sheep"),
        count("wolf"),
        sim.cycle(),
        t0.elapsed()
    );
    println!("CSV written to {}", out_dir.display());

    // 2. Replicates from seeds derived from the master seed.
    let seeds = replicate_seeds(sim.seed(), REPLICATES);
    let t1 = Instant::now();
    let outcomes = run_replicates(Arc::clone(&model), &config, &seeds, config.total_ticks, |_, builder| {
        builder.population(population())
    })?;
    info!(replicates = outcomes.len(), elapsed_ms = t1.elapsed().as_millis() as u64, "replicates done");

    println!();
    println!("{:>9}  {:>20}  {:>6}  {:>6}  {:>8}", "replicate", "seed", "sheep", "wolves", "failures");
    for outcome in outcomes {
        let outcome = outcome?;
        let agents = &outcome.snapshot.agents;
        let sheep = agents.iter().filter(|a| a.species == "sheep").count();
        let wolves = agents.len() - sheep;
        println!(
            "{:>9}  {:>20}  {:>6}  {:>6}  {:>8}",
            outcome.replicate.0, outcome.seed, sheep, wolves, outcome.failures
        );
    }
    Ok(())
}
