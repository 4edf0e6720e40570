//! # BRANTA Headless Demo
//!
//! THE STANDARD SCENARIO:
//!
//! Burst Spawn → Accel Integration → Velocity Integration → Cull OOB
//!
//! Bodies spawn in bursts around cycling origins, drift under constant
//! gravity, and are culled once they leave the live region. The run is
//! fully deterministic for a given config and seed schedule.
//!
//! Usage: `branta_demo [path/to/sim.toml]`

use std::path::Path;
use std::time::Instant;

use branta::kernel::Vec3;
use branta::{register_dynamics, sim_schema, spawn_burst, SimConfig, SimStats};

/// Ticks between spawn bursts (one burst per simulated second at 60 Hz).
const SPAWN_INTERVAL_TICKS: usize = 60;

/// Burst origins, cycled per burst.
const ORIGINS: [(f32, f32); 4] = [(0.0, 0.0), (0.8, -0.4), (-0.8, 0.4), (0.4, 0.8)];

/// Results from a headless simulation run.
#[derive(Debug)]
struct DemoResult {
    /// Ticks executed.
    ticks_run: usize,
    /// Bursts fired.
    bursts: usize,
    /// Bodies spawned across all bursts.
    spawned_total: usize,
    /// Bodies alive when the run ended.
    live_at_end: usize,
    /// Bodies removed by the cull stage.
    culled_total: usize,
    /// Average tick time in microseconds.
    avg_tick_us: u64,
    /// Slowest tick in microseconds.
    max_tick_us: u64,
}

/// Runs the standard scenario to completion.
fn run_simulation(config: &SimConfig) -> DemoResult {
    let mut world = sim_schema(config.max_entities)
        .build::<SimStats>()
        .expect("demo schema is valid");
    assert!(register_dynamics(&mut world, config.cull_bound));

    let mut stats = SimStats::default();
    let mut spawned_total = 0usize;
    let mut bursts = 0usize;
    let mut tick_times = Vec::with_capacity(config.ticks);

    for tick in 0..config.ticks {
        if tick % SPAWN_INTERVAL_TICKS == 0 {
            let (ox, oy) = ORIGINS[bursts % ORIGINS.len()];
            let seed = bursts as u32 * 101 + 7;
            let ids = spawn_burst(
                &mut world,
                config.spawn_count,
                Vec3::new(ox, oy, 0.0),
                seed,
            );
            spawned_total += ids.len();
            bursts += 1;
        }

        let tick_start = Instant::now();
        world.advance(&mut stats, config.tick_dt);
        tick_times.push(tick_start.elapsed().as_micros() as u64);
    }

    let avg_tick_us = tick_times.iter().sum::<u64>() / tick_times.len().max(1) as u64;
    let max_tick_us = tick_times.iter().copied().max().unwrap_or(0);

    DemoResult {
        ticks_run: config.ticks,
        bursts,
        spawned_total,
        live_at_end: world.entity_count(),
        culled_total: stats.culled,
        avg_tick_us,
        max_tick_us,
    }
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           BRANTA HEADLESS DEMO                                   ║");
    println!("║           Burst → Integrate → Cull                               ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  Every body alive or culled must trace back to a burst.          ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::from_toml_path(Path::new(&path)) {
            Ok(config) => {
                println!("Loaded config from {path}");
                config
            }
            Err(err) => {
                eprintln!("✗ {err}");
                std::process::exit(1);
            }
        },
        None => {
            println!("No config given, using defaults");
            SimConfig::default()
        }
    };

    println!();
    println!("┌─ CONFIG ────────────────────────────────────────────────────────┐");
    println!("│ Max Entities:       {}                                        ", config.max_entities);
    println!("│ Tick dt:            {:.4}s                                    ", config.tick_dt);
    println!("│ Spawn Count:        {} per burst                              ", config.spawn_count);
    println!("│ Cull Bound:         ±{:.1}                                     ", config.cull_bound);
    println!("│ Ticks:              {}                                        ", config.ticks);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    println!("Running {} ticks...", config.ticks);
    let run_start = Instant::now();
    let result = run_simulation(&config);
    let run_duration = run_start.elapsed();

    println!();
    println!("┌─ THROUGHPUT ────────────────────────────────────────────────────┐");
    println!("│ Run Duration:       {:.3}s                                     ", run_duration.as_secs_f64());
    println!("│ Ticks:              {}                                        ", result.ticks_run);
    println!("│ Ticks/sec:          {:.0}                                      ", result.ticks_run as f64 / run_duration.as_secs_f64());
    println!("│ Average Tick:       {:.3} ms                                   ", result.avg_tick_us as f64 / 1000.0);
    println!("│ Slowest Tick:       {:.3} ms                                   ", result.max_tick_us as f64 / 1000.0);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ WORLD STATE ───────────────────────────────────────────────────┐");
    println!("│ Bursts Fired:       {}                                        ", result.bursts);
    println!("│ Bodies Spawned:     {}                                        ", result.spawned_total);
    println!("│ Bodies Live:        {}                                        ", result.live_at_end);
    println!("│ Bodies Culled:      {}                                        ", result.culled_total);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let conserved = result.live_at_end + result.culled_total == result.spawned_total;
    let capacity_held = result.live_at_end <= config.max_entities;

    if conserved {
        println!("✓ CONSERVATION HELD: {} live + {} culled == {} spawned",
            result.live_at_end, result.culled_total, result.spawned_total);
    } else {
        println!("✗ CONSERVATION BROKEN: {} live + {} culled != {} spawned",
            result.live_at_end, result.culled_total, result.spawned_total);
    }
    if capacity_held {
        println!("✓ CAPACITY HELD: {} live <= {} slots", result.live_at_end, config.max_entities);
    } else {
        println!("✗ CAPACITY EXCEEDED: {} live > {} slots", result.live_at_end, config.max_entities);
    }

    if conserved && capacity_held {
        println!();
        println!("✅ DEMO RUN PASSED");
        std::process::exit(0);
    } else {
        println!();
        println!("❌ DEMO RUN FAILED");
        std::process::exit(1);
    }
}
