//! Standing wave in a traction-free box, on one or more ranks.
//!
//! Demonstrates:
//!   1. Reading preferences from a flat TOML file
//!   2. Building one `Simulation` per rank over a channel world
//!   3. Initializing the analytic mode and observing each step
//!   4. Comparing against the exact solution at the end
//!
//! Run with:
//!   RUST_LOG=info cargo run --example standing_wave -- [prefs.toml] [ranks]

use std::error::Error;
use std::time::Duration;

use shear_comm::{ChannelComm, Communicator};
use shear_core::{Real, Role, GRID_X, GRID_Y};
use shear_engine::{Simulation, SolverConfig, StressFreeBox};

// ─── Mode ───────────────────────────────────────────────────────

const MODE_N: u32 = 2;
const MODE_M: u32 = 1;
const REPORT_EVERY: u64 = 100;

fn max_error(sim: &Simulation, mode: &StressFreeBox) -> Real {
    let mut worst: Real = 0.0;
    for sub in sim.domain().subdomains() {
        if sub.role() != Ok(Role::Volume) {
            continue;
        }
        let (Ok(x), Ok(y), Ok(v3)) = (sub.field(GRID_X), sub.field(GRID_Y), sub.field("v3")) else {
            continue;
        };
        for n in 0..v3.len() {
            let exact = mode.value("v3", x[n], y[n], sim.time()).unwrap_or_default();
            worst = worst.max((v3[n] - exact).abs());
        }
    }
    worst
}

fn run_rank(config: SolverConfig, comm: ChannelComm) -> Result<Real, String> {
    let rank = comm.rank();
    let mode = StressFreeBox::new(MODE_N, MODE_M, config.material);
    let mut sim = Simulation::new(config, Box::new(comm)).map_err(|e| e.to_string())?;
    sim.initialize(&mode).map_err(|e| e.to_string())?;
    sim.run_until(sim.config().end_time, |p| {
        if p.step % REPORT_EVERY == 0 {
            tracing::info!(
                %rank,
                step = p.step,
                time = p.time,
                max_v3 = p.snapshot.max_abs("v3"),
                step_us = p.metrics.total_us,
                "progress"
            );
        }
    })
    .map_err(|e| e.to_string())?;
    Ok(max_error(&sim, &mode))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shear_engine=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SolverConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SolverConfig {
            order: 6,
            end_time: 0.5,
            ..SolverConfig::default()
        },
    };
    let ranks: u32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);
    let timeout = Duration::from_millis(config.exchange_timeout_ms);

    let errors = std::thread::scope(|s| {
        let handles: Vec<_> = ChannelComm::world(ranks, timeout)
            .into_iter()
            .map(|comm| {
                let config = config.clone();
                s.spawn(move || run_rank(config, comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| "rank panicked".to_owned())?)
            .collect::<Result<Vec<_>, String>>()
    })?;

    let worst = errors.into_iter().fold(0.0, Real::max);
    println!("max |v3 - exact| at t = {}: {worst:.3e}", config.end_time);
    Ok(())
}
