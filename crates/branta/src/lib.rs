//! # BRANTA
//!
//! Host-side crate for the BRANTA kernel: the standard dynamics pipeline,
//! TOML-loaded run configuration, and a headless demo driver.
//!
//! ## Design Principles
//!
//! 1. **The kernel stays generic** - every simulation-specific name
//!    (columns, stages) lives here, not in `branta_core`
//! 2. **Deterministic runs** - spawn spread is a pure function of a seed,
//!    so the same config and seed replay the same simulation
//! 3. **External configuration** - run parameters come from a TOML file,
//!    with defaults that work without one
//!
//! ## Example
//!
//! ```rust,ignore
//! use branta::{register_dynamics, sim_schema, spawn_burst, SimConfig, SimStats};
//! use branta_core::Vec3;
//!
//! let config = SimConfig::default();
//! let mut world = sim_schema(config.max_entities).build::<SimStats>()?;
//! register_dynamics(&mut world, config.cull_bound);
//!
//! let mut stats = SimStats::default();
//! spawn_burst(&mut world, config.spawn_count, Vec3::default(), 42);
//! world.advance(&mut stats, config.tick_dt);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod dynamics;

// Re-export the kernel
pub use branta_core as kernel;

// Re-export commonly used types
pub use config::{ConfigError, SimConfig};
pub use dynamics::{register_dynamics, sim_schema, spawn_burst, SimStats};
