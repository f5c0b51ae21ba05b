//! # Particle Core
//!
//! The simulation core for a multi-group particle-interaction system.
//!
//! This crate contains everything the engine thread touches:
//! - Structure-of-arrays particle storage with contiguous group ranges
//! - A uniform spatial grid for neighbor queries
//! - A fixed-size worker pool with a blocking `parallel_for`
//! - The force/integration step
//! - Lock-light channels between the engine thread and its consumers
//! - The tick-loop state machine driven by queued commands
//!
//! ## Architecture
//!
//! The engine thread is the only writer of simulation state. Producers push
//! [`Command`]s and publish [`ConfigSnapshot`]s; consumers read stats, world
//! snapshots and draw frames. None of these calls block on the engine.
//!
//! ## Example
//!
//! ```
//! use particle_core::{Command, ConfigSnapshot, SimulationCore};
//! use particle_data::SeedSpec;
//!
//! let config = ConfigSnapshot { threads: 1, ..Default::default() };
//! let mut core = SimulationCore::standalone(config, Some(7)).unwrap();
//! let handle = core.handle();
//!
//! handle.push_command(Command::SeedWorld(SeedSpec {
//!     sizes: vec![100, 100],
//!     ..Default::default()
//! }));
//! handle.push_command(Command::OneStep);
//! core.tick();
//!
//! assert_eq!(handle.get_stats().num_steps, 1);
//! assert_eq!(handle.get_world_snapshot().particle_count(), 200);
//! ```

/// Engine/consumer channels: double buffer, draw buffer and command queue
pub mod channels;
/// Commands accepted by the engine thread
pub mod command;
/// Runtime configuration and its validation
pub mod config;
/// Tick loop, engine thread and the cross-thread handle
pub mod engine;
/// Error types
pub mod error;
/// Tick-rate measurement and structured logging
pub mod metrics;
/// Force computation and integration
pub mod physics;
/// Random world generation
pub mod seed;
/// Uniform grid for neighbor queries
pub mod spatial_grid;
/// Fixed-size thread pool
pub mod worker_pool;
/// Particle storage, groups and interaction tables
pub mod world;

pub use channels::{CommandQueue, DoubleBuffer, DrawBuffer, DrawFrame, GridFrame, ReadView};
pub use command::Command;
pub use config::ConfigSnapshot;
pub use engine::{EngineHandle, RunState, SimulationCore, SimulationEngine};
pub use error::{Result, SimError};
pub use spatial_grid::SpatialGrid;
pub use worker_pool::WorkerPool;
pub use world::{GroupRange, ParticleWorld};
