//! Runtime configuration of the simulation engine.
//!
//! A [`ConfigSnapshot`] is a small `Copy` value published through a double
//! buffer: producers call `update_config`, the engine thread picks up the
//! latest value at the top of every iteration.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! bounds_width = 1920.0
//! bounds_height = 1080.0
//! time_scale = 1.0
//! viscosity = 0.1
//! target_tps = 60.0
//! threads = -1
//! report_grid = true
//! ```

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

macro_rules! ensure_config {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err(SimError::invalid_config($msg));
        }
    };
}

/// Simulation parameters that may change while the engine runs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ConfigSnapshot {
    pub bounds_width: f32,
    pub bounds_height: f32,
    /// Multiplier applied to forces when integrating velocity.
    pub time_scale: f32,
    /// Fraction of velocity lost per step, in `[0, 1]`.
    pub viscosity: f32,
    /// Distance from each wall inside which particles are pushed back.
    pub wall_repel: f32,
    pub wall_strength: f32,
    pub gravity_x: f32,
    pub gravity_y: f32,
    /// Steps per second; `0` runs unthrottled.
    pub target_tps: f32,
    /// Worker count; `0` or `-1` means auto.
    pub threads: i32,
    /// Compute the per-cell aggregate grid for overlays.
    pub report_grid: bool,
    /// Hint to consumers that they may interpolate between the last two ticks.
    pub interpolate: bool,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            bounds_width: 1280.0,
            bounds_height: 720.0,
            time_scale: 1.0,
            viscosity: 0.1,
            wall_repel: 40.0,
            wall_strength: 0.1,
            gravity_x: 0.0,
            gravity_y: 0.0,
            target_tps: 60.0,
            threads: -1,
            report_grid: false,
            interpolate: true,
        }
    }
}

impl ConfigSnapshot {
    /// Validates all configuration parameters.
    ///
    /// # Validation Rules
    /// - Bounds must be positive and finite
    /// - Time scale must be non-negative
    /// - Viscosity must be in `[0.0, 1.0]`
    /// - Thread count must be `>= -1`
    /// - Wall parameters and target TPS must be non-negative
    pub fn validate(&self) -> Result<()> {
        ensure_config!(
            self.bounds_width.is_finite() && self.bounds_width > 0.0,
            "Bounds width must be positive"
        );
        ensure_config!(
            self.bounds_height.is_finite() && self.bounds_height > 0.0,
            "Bounds height must be positive"
        );
        ensure_config!(
            self.time_scale.is_finite() && self.time_scale >= 0.0,
            "Time scale must be non-negative"
        );
        ensure_config!(
            (0.0..=1.0).contains(&self.viscosity),
            "Viscosity must be in [0.0, 1.0]"
        );
        ensure_config!(self.threads >= -1, "Thread count must be >= -1");
        ensure_config!(
            self.wall_repel.is_finite() && self.wall_repel >= 0.0,
            "Wall repel distance must be non-negative"
        );
        ensure_config!(
            self.wall_strength.is_finite() && self.wall_strength >= 0.0,
            "Wall strength must be non-negative"
        );
        ensure_config!(
            self.gravity_x.is_finite() && self.gravity_y.is_finite(),
            "Gravity must be finite"
        );
        ensure_config!(
            self.target_tps.is_finite() && self.target_tps >= 0.0,
            "Target TPS must be non-negative"
        );
        Ok(())
    }

    /// Parses and validates a TOML document. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective worker count: `threads <= 0` resolves to
    /// `max(1, hardware_threads - 2)`, leaving a core for the renderer and
    /// one for the OS.
    #[must_use]
    pub fn resolved_threads(&self) -> usize {
        resolve_thread_count(self.threads)
    }
}

#[must_use]
pub fn resolve_thread_count(requested: i32) -> usize {
    if requested > 0 {
        return requested as usize;
    }
    let hw = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    hw.saturating_sub(2).max(1)
}
