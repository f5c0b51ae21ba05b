//! Tick-rate measurement and structured logging for the engine.

use std::time::{Duration, Instant};

/// Steps between periodic progress log lines.
pub const LOG_INTERVAL: u64 = 1000;

/// Rolling steps-per-second measured over fixed windows.
///
/// The rate is recomputed each time a window (about one second) closes, so
/// it reads as a stable number rather than a per-tick jitter.
#[derive(Debug, Clone)]
pub struct TickRateMeter {
    window: Duration,
    window_start: Instant,
    window_steps: u64,
    tps: f32,
}

impl Default for TickRateMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickRateMeter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            window_steps: 0,
            tps: 0.0,
        }
    }

    /// Starts a fresh measurement window and forgets the last rate.
    pub fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.window_steps = 0;
        self.tps = 0.0;
    }

    /// Records one engine iteration; `stepped` tells whether physics ran.
    pub fn tick(&mut self, now: Instant, stepped: bool) {
        if stepped {
            self.window_steps += 1;
        }
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= self.window {
            self.tps = (self.window_steps as f64 / elapsed.as_secs_f64()) as f32;
            self.window_start = now;
            self.window_steps = 0;
        }
    }

    #[must_use]
    pub fn tps(&self) -> f32 {
        self.tps
    }
}

/// Emits a progress line every [`LOG_INTERVAL`] steps.
pub fn record_step(num_steps: u64, particles: usize, tps: f32, step_time: Duration) {
    if num_steps > 0 && num_steps % LOG_INTERVAL == 0 {
        tracing::info!(
            steps = num_steps,
            particles = particles,
            tps = tps,
            step_ms = step_time.as_secs_f64() * 1000.0,
            "Simulation progress"
        );
    }
}
