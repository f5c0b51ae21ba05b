use anyhow::{Context, Result};
use particle_core::seed::random_seed_spec;
use particle_core::{Command, ConfigSnapshot, SimulationEngine};
use particle_data::SeedSpec;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Host settings gathered from the command line.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub config_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
    pub groups: usize,
    pub group_size: usize,
    pub radius: f32,
    pub duration: Option<Duration>,
    /// Overrides `threads` from the config file.
    pub threads: Option<i32>,
    /// Fixed seed for rule generation and particle scatter.
    pub rng_seed: Option<u64>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            seed_path: None,
            groups: 4,
            group_size: particle_data::data::seed::DEFAULT_GROUP_SIZE,
            radius: 80.0,
            duration: None,
            threads: None,
            rng_seed: None,
        }
    }
}

pub struct App {
    pub engine: SimulationEngine,
    pub duration: Option<Duration>,
    config_path: Option<PathBuf>,
    config_last_modified: Option<SystemTime>,
    threads_override: Option<i32>,
}

impl App {
    /// Loads config and seed, creates the engine and queues the initial
    /// world. The engine thread is not started yet.
    pub fn new(options: AppOptions) -> Result<Self> {
        let mut config = match &options.config_path {
            Some(path) => Self::load_config(path)?,
            None => ConfigSnapshot::default(),
        };
        if let Some(threads) = options.threads {
            config.threads = threads;
        }
        config.validate()?;

        let engine = match options.rng_seed {
            Some(seed) => SimulationEngine::with_rng_seed(config, seed)?,
            None => SimulationEngine::new(config)?,
        };

        let seed = match &options.seed_path {
            Some(path) => Self::load_seed(path)?,
            None => {
                let mut rng = match options.rng_seed {
                    Some(s) => ChaCha8Rng::seed_from_u64(s),
                    None => ChaCha8Rng::from_entropy(),
                };
                random_seed_spec(options.groups, options.group_size, options.radius, &mut rng)
            }
        };
        tracing::info!(
            groups = seed.group_count(),
            particles = seed.total_particles(),
            "Initial world prepared"
        );
        engine.push_command(Command::SeedWorld(seed));

        let config_last_modified = options
            .config_path
            .as_deref()
            .and_then(|p| std::fs::metadata(p).ok())
            .and_then(|m| m.modified().ok());

        Ok(Self {
            engine,
            duration: options.duration,
            config_path: options.config_path,
            config_last_modified,
            threads_override: options.threads,
        })
    }

    pub fn load_config(path: &Path) -> Result<ConfigSnapshot> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        ConfigSnapshot::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn load_seed(path: &Path) -> Result<SeedSpec> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        SeedSpec::from_json(&content)
            .with_context(|| format!("Invalid seed file {}", path.display()))
    }

    /// Re-reads the config file when its modification time changed and
    /// publishes it. Returns `true` when a new config was applied.
    pub fn check_config_reload(&mut self) -> Result<bool> {
        let Some(path) = self.config_path.clone() else {
            return Ok(false);
        };
        let Ok(metadata) = std::fs::metadata(&path) else {
            return Ok(false);
        };
        let modified = metadata.modified()?;
        if Some(modified) == self.config_last_modified {
            return Ok(false);
        }
        self.config_last_modified = Some(modified);

        let mut config = Self::load_config(&path)?;
        if let Some(threads) = self.threads_override {
            config.threads = threads;
        }
        self.engine.update_config(config)?;
        Ok(true)
    }

    pub fn log_stats(&self) {
        let stats = self.engine.get_stats();
        tracing::info!(
            tps = stats.effective_tps,
            steps = stats.num_steps,
            particles = stats.particles,
            groups = stats.groups,
            threads = stats.threads,
            step_ms = stats.last_step_ms,
            "Engine stats"
        );
    }
}
