//! Graceful shutdown handling for the headless host.
//!
//! A shutdown request is a shared flag: the Ctrl+C watcher, the duration
//! check and the main loop all see the same [`ShutdownManager`].

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

/// Manages graceful shutdown of the application.
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    shutdown_requested: Arc<AtomicBool>,
    exit_code: Arc<AtomicI32>,
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownManager {
    /// Creates a new shutdown manager.
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
            exit_code: Arc::new(AtomicI32::new(0)),
        }
    }

    /// Requests shutdown.
    pub fn request_shutdown(&self) {
        if !self.shutdown_requested.swap(true, Ordering::SeqCst) {
            tracing::info!("Shutdown requested");
        }
    }

    /// Checks if shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn set_exit_code(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }

    /// Stops the engine thread and logs the final counters.
    pub fn cleanup(&self, app: &mut crate::app::App) -> Result<()> {
        tracing::info!("Performing shutdown cleanup...");
        let stats = app.engine.get_stats();
        app.engine.end().context("Failed to stop simulation engine")?;
        tracing::info!(
            steps = stats.num_steps,
            particles = stats.particles,
            "Cleanup complete"
        );
        Ok(())
    }
}
