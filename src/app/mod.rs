pub mod shutdown;
pub mod state;

pub use shutdown::ShutdownManager;
pub use state::{App, AppOptions};

use anyhow::Result;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STATS_INTERVAL: Duration = Duration::from_secs(1);
const CONFIG_CHECK_INTERVAL: Duration = Duration::from_secs(2);

impl App {
    /// Starts the engine and supervises it until Ctrl+C or the configured
    /// duration. The engine thread keeps running; call
    /// [`ShutdownManager::cleanup`] afterwards to stop it.
    pub async fn run(&mut self, shutdown: &ShutdownManager) -> Result<()> {
        self.engine.begin()?;

        let watcher = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, initiating graceful shutdown...");
                watcher.request_shutdown();
            }
        });

        let started = Instant::now();
        let mut last_stats = Instant::now();
        let mut last_config_check = Instant::now();
        let mut ticker = tokio::time::interval(POLL_INTERVAL);

        while !shutdown.is_shutdown_requested() {
            ticker.tick().await;

            if self.duration.is_some_and(|d| started.elapsed() >= d) {
                tracing::info!("Run duration reached");
                shutdown.request_shutdown();
                break;
            }

            if last_config_check.elapsed() >= CONFIG_CHECK_INTERVAL {
                match self.check_config_reload() {
                    Ok(true) => tracing::info!("Configuration hot-reloaded successfully"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(error = %e, "Config reload rejected"),
                }
                last_config_check = Instant::now();
            }

            if last_stats.elapsed() >= STATS_INTERVAL {
                self.log_stats();
                last_stats = Instant::now();
            }

            if !self.engine.is_running() {
                tracing::error!("Engine thread exited unexpectedly");
                shutdown.set_exit_code(1);
                break;
            }
        }
        Ok(())
    }
}
