//! Simulation engine: the tick loop and its cross-thread surface.
//!
//! [`SimulationCore`] owns every piece of mutable simulation state and is
//! driven by exactly one thread. [`SimulationEngine`] runs a core on a
//! dedicated background thread; [`EngineHandle`] is the cloneable,
//! non-blocking surface other threads use to push commands, update the
//! configuration and read the published snapshots.
//!
//! ## Iteration
//! 1. resize the worker pool if the configured thread count changed
//! 2. drain and apply queued commands in order (`Quit` stops the batch)
//! 3. step physics when `Running` or `OneStep`
//! 4. publish the draw buffer and world snapshot
//! 5. publish stats
//! 6. sleep until the next absolute deadline when a target rate is set

use crate::channels::{CommandQueue, DoubleBuffer, DrawBuffer, ReadView};
use crate::command::Command;
use crate::config::ConfigSnapshot;
use crate::error::{Result, SimError};
use crate::metrics::{self, TickRateMeter};
use crate::physics::{self, ForceBuffers, StepParams};
use crate::spatial_grid::SpatialGrid;
use crate::worker_pool::WorkerPool;
use crate::world::ParticleWorld;
use particle_data::data::seed::{DEFAULT_GROUP_SIZE, DEFAULT_RADIUS2};
use particle_data::{Color, RulePatch, SeedSpec, StatsSnapshot, WorldSnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Idle sleep while paused without a target rate, so the loop does not spin.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Longest pause between ticks; slower target rates are capped here.
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(3600);

/// Pacing sleeps wake at least this often to notice a queued `Quit`.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Paused,
    /// Step once on the next iteration, then fall back to `Paused`.
    OneStep,
    Quit,
}

#[derive(Debug)]
struct Shared {
    commands: CommandQueue,
    config: DoubleBuffer<ConfigSnapshot>,
    stats: DoubleBuffer<StatsSnapshot>,
    world: DoubleBuffer<WorldSnapshot>,
    draw: DrawBuffer,
    epoch: Instant,
}

/// Thread-safe producer/consumer surface of a running engine.
///
/// Every method returns immediately; none waits for the engine thread.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    fn new(config: ConfigSnapshot) -> Self {
        Self {
            shared: Arc::new(Shared {
                commands: CommandQueue::new(),
                config: DoubleBuffer::new(config),
                stats: DoubleBuffer::default(),
                world: DoubleBuffer::default(),
                draw: DrawBuffer::new(),
                epoch: Instant::now(),
            }),
        }
    }

    /// Queues a command for the engine thread (fire and forget).
    pub fn push_command(&self, command: Command) {
        self.shared.commands.push(command);
    }

    /// Validates and publishes a new configuration.
    pub fn update_config(&self, config: ConfigSnapshot) -> Result<()> {
        config.validate()?;
        self.shared.config.publish(config);
        Ok(())
    }

    #[must_use]
    pub fn get_config(&self) -> ConfigSnapshot {
        self.shared.config.acquire()
    }

    #[must_use]
    pub fn get_stats(&self) -> StatsSnapshot {
        self.shared.stats.acquire()
    }

    #[must_use]
    pub fn get_world_snapshot(&self) -> WorldSnapshot {
        self.shared.world.acquire()
    }

    /// Pins the two most recent draw frames until [`EngineHandle::end_read_draw`].
    #[must_use]
    pub fn begin_read_draw(&self) -> ReadView {
        self.shared.draw.begin_read()
    }

    pub fn end_read_draw(&self, view: ReadView) {
        self.shared.draw.end_read(view);
    }

    /// Engine clock in seconds; draw-frame timestamps use the same timeline.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.shared.epoch.elapsed().as_secs_f64()
    }
}

/// Engine-thread state: world, grid, pool, RNG and run state.
pub struct SimulationCore {
    handle: EngineHandle,
    world: ParticleWorld,
    grid: SpatialGrid,
    pool: WorkerPool,
    forces: ForceBuffers,
    rng: ChaCha8Rng,
    state: RunState,
    config: ConfigSnapshot,
    applied_threads: Option<i32>,
    num_steps: u64,
    last_step: Duration,
    meter: TickRateMeter,
    next_deadline: Option<Instant>,
}

impl SimulationCore {
    fn new(handle: EngineHandle, rng: ChaCha8Rng) -> Self {
        let config = handle.get_config();
        Self {
            handle,
            world: ParticleWorld::new(),
            grid: SpatialGrid::new(),
            pool: WorkerPool::unstarted(),
            forces: ForceBuffers::default(),
            rng,
            state: RunState::NotStarted,
            config,
            applied_threads: None,
            num_steps: 0,
            last_step: Duration::ZERO,
            meter: TickRateMeter::new(),
            next_deadline: None,
        }
    }

    /// A core driven by the caller instead of a background thread.
    pub fn standalone(config: ConfigSnapshot, rng_seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self::new(EngineHandle::new(config), rng))
    }

    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn world(&self) -> &ParticleWorld {
        &self.world
    }

    #[must_use]
    pub fn num_steps(&self) -> u64 {
        self.num_steps
    }

    #[must_use]
    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Picks up the latest published config and resizes the pool if the
    /// requested thread count changed.
    pub fn sync_config(&mut self) {
        self.config = self.handle.get_config();
        if self.applied_threads != Some(self.config.threads) {
            if let Err(e) = self.pool.resize(self.config.threads) {
                tracing::error!(error = %e, "Failed to resize worker pool");
            }
            self.applied_threads = Some(self.config.threads);
        }
    }

    /// Drains the command queue and applies the batch in order. A `Quit`
    /// discards the rest of the batch.
    pub fn process_commands(&mut self) {
        for command in self.handle.shared.commands.drain() {
            if self.state == RunState::Quit {
                break;
            }
            self.apply_command(command);
        }
    }

    pub fn apply_command(&mut self, command: Command) {
        tracing::trace!(command = command.name(), "Applying command");
        match command {
            Command::SeedWorld(seed) => self.reseed(&seed),
            Command::ResetWorld => {
                let seed = self.world.to_seed();
                self.reseed(&seed);
            }
            Command::Pause => self.state = RunState::Paused,
            Command::Resume => self.state = RunState::Running,
            Command::OneStep => self.state = RunState::OneStep,
            Command::ApplyRules(patch) => self.apply_rules(&patch),
            Command::AddGroup {
                size,
                color,
                radius2,
            } => self.add_group(size, color, radius2),
            Command::RemoveGroup { index } => {
                if let Err(e) = self.world.remove_group(index) {
                    tracing::debug!(error = %e, "Ignoring remove_group");
                    return;
                }
                self.world.finalize_groups();
                self.structural_reset();
                tracing::info!(index, groups = self.world.group_count(), "Removed group");
            }
            Command::RemoveAllGroups => {
                self.world.clear();
                self.world.init_rule_tables(0);
                self.world.finalize_groups();
                self.structural_reset();
                tracing::info!("Removed all groups");
            }
            Command::ResizeGroup { index, new_size } => {
                match self.world.resize_group(index, new_size) {
                    Ok(added) => {
                        let (w, h) = (self.config.bounds_width, self.config.bounds_height);
                        self.world.randomize_range(added, w, h, &mut self.rng);
                        self.world.finalize_groups();
                        self.structural_reset();
                        tracing::info!(index, new_size, "Resized group");
                    }
                    Err(e) => tracing::debug!(error = %e, "Ignoring resize_group"),
                }
            }
            Command::Quit => self.state = RunState::Quit,
        }
    }

    fn reseed(&mut self, seed: &SeedSpec) {
        self.world.populate(seed);
        let (w, h) = (self.config.bounds_width, self.config.bounds_height);
        let n = self.world.particle_count();
        self.world.randomize_range(0..n, w, h, &mut self.rng);
        self.structural_reset();
        tracing::info!(
            groups = self.world.group_count(),
            particles = n,
            "World seeded"
        );
    }

    fn structural_reset(&mut self) {
        self.num_steps = 0;
        self.meter.reset(Instant::now());
    }

    fn add_group(&mut self, size: usize, color: Color, radius2: f32) {
        match self.world.add_group(size, color) {
            Ok(g) => {
                let _ = self.world.set_radius2(g, radius2);
                let range = self.world.group_range(g).map(|r| r.as_range());
                if let Ok(range) = range {
                    let (w, h) = (self.config.bounds_width, self.config.bounds_height);
                    self.world.randomize_range(range, w, h, &mut self.rng);
                }
                self.world.finalize_groups();
                self.structural_reset();
                tracing::info!(group = g, size, "Added group");
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring add_group"),
        }
    }

    fn apply_rules(&mut self, patch: &RulePatch) {
        if patch.group_count != self.world.group_count() {
            tracing::info!(
                from = self.world.group_count(),
                to = patch.group_count,
                "Rule patch changes group count, reseeding"
            );
            let seed = seed_from_patch(&self.world, patch);
            self.reseed(&seed);
            return;
        }

        if patch.has_rules() {
            self.world.set_rules(&patch.rules);
        }
        for g in 0..patch.group_count {
            if patch.has_radii2() {
                let _ = self.world.set_radius2(g, patch.radii2[g]);
            }
            if patch.has_colors() {
                let _ = self.world.set_color(g, patch.colors[g]);
            }
            if patch.has_enabled() {
                let _ = self.world.set_enabled(g, patch.enabled[g]);
            }
        }
        tracing::debug!("Rule patch applied in place");
    }

    /// Runs one physics step over the whole world.
    pub fn step(&mut self) {
        let started = Instant::now();
        let params = StepParams::from(&self.config);
        let n = self.world.particle_count();

        self.grid.resize(
            params.width,
            params.height,
            self.world.max_interaction_radius(),
            n,
        );
        let world = &self.world;
        self.grid.build(n, |i| world.x[i], |i| world.y[i]);

        physics::step(
            &mut self.world,
            &self.grid,
            &self.pool,
            &mut self.forces,
            &params,
        );

        self.num_steps += 1;
        self.last_step = started.elapsed();
        metrics::record_step(self.num_steps, n, self.meter.tps(), self.last_step);
    }

    /// Publishes draw frame, world snapshot and stats for this iteration.
    pub fn publish(&mut self) {
        let now = self.handle.now();
        let report_grid = self.config.report_grid;
        let n = self.world.particle_count();

        if report_grid {
            self.grid.resize(
                self.config.bounds_width,
                self.config.bounds_height,
                self.world.max_interaction_radius(),
                n,
            );
            let world = &self.world;
            self.grid.build(n, |i| world.x[i], |i| world.y[i]);
        }

        let world = &self.world;
        let grid = &self.grid;
        let num_steps = self.num_steps;
        self.handle.shared.draw.publish_with(|frame| {
            frame.x.clear();
            frame.x.extend_from_slice(&world.x);
            frame.y.clear();
            frame.y.extend_from_slice(&world.y);
            frame.vx.clear();
            frame.vx.extend_from_slice(&world.vx);
            frame.vy.clear();
            frame.vy.extend_from_slice(&world.vy);
            frame.timestamp = now;
            frame.num_steps = num_steps;
            if report_grid {
                frame
                    .grid
                    .get_or_insert_with(Default::default)
                    .fill_from(grid, &world.vx, &world.vy);
            } else {
                frame.grid = None;
            }
        });

        self.handle
            .shared
            .world
            .publish(self.world.snapshot(self.num_steps));

        self.handle.shared.stats.publish(StatsSnapshot {
            effective_tps: self.meter.tps(),
            particles: n,
            groups: self.world.group_count(),
            threads: self.pool.size(),
            last_step_ms: (self.last_step.as_secs_f64() * 1000.0) as f32,
            num_steps: self.num_steps,
            published_at: now,
        });
    }

    /// One loop iteration without the rate-regulation sleep. Returns
    /// `false` once the core has quit.
    pub fn tick(&mut self) -> bool {
        if self.state == RunState::Quit {
            return false;
        }
        self.sync_config();
        self.process_commands();
        if self.state == RunState::Quit {
            return false;
        }

        let stepped = matches!(self.state, RunState::Running | RunState::OneStep);
        if stepped {
            self.step();
            if self.state == RunState::OneStep {
                self.state = RunState::Paused;
            }
        }
        self.meter.tick(Instant::now(), stepped);
        self.publish();
        true
    }

    /// Sleeps until the next absolute tick deadline. A deadline already in
    /// the past is reset to now instead of being caught up.
    fn regulate(&mut self) {
        let Some(period) = tick_period(self.config.target_tps) else {
            self.next_deadline = None;
            if self.state == RunState::Paused {
                thread::sleep(IDLE_SLEEP);
            }
            return;
        };

        let (deadline, wait) = next_deadline(self.next_deadline, period, Instant::now());
        self.next_deadline = Some(deadline);
        if wait {
            self.sleep_until(deadline);
        }
    }

    fn sleep_until(&self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline || self.handle.shared.commands.quit_pending() {
                return;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }

    /// Runs the loop until `Quit`.
    pub fn run(mut self) {
        if self.state == RunState::NotStarted {
            self.state = RunState::Running;
        }
        tracing::info!("Engine loop started");
        while self.tick() {
            self.regulate();
        }
        if self.pool.is_started() {
            let _ = self.pool.stop();
        }
        tracing::info!(steps = self.num_steps, "Engine loop exited");
    }
}

/// Tick period for `target_tps`, or `None` when pacing is off.
///
/// Rates too small for a representable period are capped at
/// [`MAX_TICK_PERIOD`].
#[must_use]
pub fn tick_period(target_tps: f32) -> Option<Duration> {
    if target_tps <= 0.0 {
        return None;
    }
    let period = Duration::try_from_secs_f64(1.0 / f64::from(target_tps))
        .unwrap_or(MAX_TICK_PERIOD);
    Some(period.min(MAX_TICK_PERIOD))
}

/// Advances the absolute deadline `previous` by one `period`.
///
/// Returns the new deadline and whether the loop should sleep until it. A
/// deadline already reached is reset to `now`, so missed ticks are dropped
/// rather than caught up.
#[must_use]
pub fn next_deadline(
    previous: Option<Instant>,
    period: Duration,
    now: Instant,
) -> (Instant, bool) {
    let deadline = previous.map_or(now + period, |d| d + period);
    if deadline <= now {
        (now, false)
    } else {
        (deadline, true)
    }
}

/// Full seed built from the live tables overlaid with `patch`, used when a
/// patch changes the group count.
#[must_use]
pub fn seed_from_patch(world: &ParticleWorld, patch: &RulePatch) -> SeedSpec {
    let g = patch.group_count;
    let current = world.group_count();
    let fallback_size = if current > 0 {
        (world.particle_count() / current).max(1)
    } else {
        DEFAULT_GROUP_SIZE
    };

    let sizes = (0..g)
        .map(|i| {
            patch
                .sizes
                .get(i)
                .copied()
                .or_else(|| world.group_range(i).ok().map(|r| r.len()))
                .unwrap_or(fallback_size)
        })
        .collect();
    let colors = if patch.has_colors() {
        patch.colors.clone()
    } else {
        (0..g)
            .map(|i| world.colors().get(i).copied().unwrap_or_else(|| Color::palette(i)))
            .collect()
    };
    let radii2 = if patch.has_radii2() {
        patch.radii2.clone()
    } else {
        (0..g)
            .map(|i| world.radii2().get(i).copied().unwrap_or(DEFAULT_RADIUS2))
            .collect()
    };
    let enabled = if patch.has_enabled() {
        patch.enabled.clone()
    } else {
        (0..g)
            .map(|i| world.enabled_flags().get(i).copied().unwrap_or(true))
            .collect()
    };
    let rules = if patch.has_rules() {
        patch.rules.clone()
    } else {
        let mut rules = vec![0.0; g * g];
        for i in 0..g.min(current) {
            for j in 0..g.min(current) {
                rules[i * g + j] = world.rule(i, j);
            }
        }
        rules
    };

    SeedSpec {
        sizes,
        colors,
        radii2,
        enabled,
        rules,
    }
}

/// A [`SimulationCore`] running on its own thread.
pub struct SimulationEngine {
    handle: EngineHandle,
    core: Option<SimulationCore>,
    thread: Option<JoinHandle<()>>,
}

impl SimulationEngine {
    /// Creates an engine with an entropy-seeded RNG. Nothing runs until
    /// [`SimulationEngine::begin`].
    pub fn new(config: ConfigSnapshot) -> Result<Self> {
        Self::build(config, None)
    }

    /// Like [`SimulationEngine::new`] but with a fixed RNG seed for the
    /// particle scatter.
    pub fn with_rng_seed(config: ConfigSnapshot, seed: u64) -> Result<Self> {
        Self::build(config, Some(seed))
    }

    fn build(config: ConfigSnapshot, seed: Option<u64>) -> Result<Self> {
        let core = SimulationCore::standalone(config, seed)?;
        Ok(Self {
            handle: core.handle(),
            core: Some(core),
            thread: None,
        })
    }

    /// Starts the engine thread; the core enters `Running` immediately.
    pub fn begin(&mut self) -> Result<()> {
        let core = self.core.take().ok_or(SimError::EngineAlreadyStarted)?;
        let handle = thread::Builder::new()
            .name("particle-engine".to_string())
            .spawn(move || core.run())?;
        self.thread = Some(handle);
        tracing::info!("Engine started");
        Ok(())
    }

    /// Requests `Quit` and joins the engine thread.
    pub fn end(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        self.handle.push_command(Command::Quit);
        thread.join().map_err(|_| SimError::EngineThreadPanicked)?;
        tracing::info!("Engine stopped");
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    pub fn push_command(&self, command: Command) {
        self.handle.push_command(command);
    }

    pub fn update_config(&self, config: ConfigSnapshot) -> Result<()> {
        self.handle.update_config(config)
    }

    #[must_use]
    pub fn get_config(&self) -> ConfigSnapshot {
        self.handle.get_config()
    }

    #[must_use]
    pub fn get_stats(&self) -> StatsSnapshot {
        self.handle.get_stats()
    }

    #[must_use]
    pub fn get_world_snapshot(&self) -> WorldSnapshot {
        self.handle.get_world_snapshot()
    }

    #[must_use]
    pub fn begin_read_draw(&self) -> ReadView {
        self.handle.begin_read_draw()
    }

    pub fn end_read_draw(&self, view: ReadView) {
        self.handle.end_read_draw(view);
    }

    #[must_use]
    pub fn now(&self) -> f64 {
        self.handle.now()
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        if let Err(e) = self.end() {
            tracing::error!(error = %e, "Engine shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ConfigSnapshot {
        ConfigSnapshot {
            bounds_width: 200.0,
            bounds_height: 100.0,
            threads: 2,
            target_tps: 0.0,
            ..Default::default()
        }
    }

    fn seed(sizes: &[usize]) -> SeedSpec {
        let g = sizes.len();
        SeedSpec {
            sizes: sizes.to_vec(),
            radii2: vec![100.0; g],
            rules: (0..g * g).map(|k| k as f32 * 0.1).collect(),
            ..Default::default()
        }
    }

    fn core_with(sizes: &[usize]) -> SimulationCore {
        let mut core = SimulationCore::standalone(small_config(), Some(1)).unwrap();
        core.apply_command(Command::SeedWorld(seed(sizes)));
        core
    }

    #[test]
    fn test_seed_scatters_within_bounds() {
        let core = core_with(&[10, 20]);
        let world = core.world();
        assert_eq!(world.particle_count(), 30);
        assert!(world.x.iter().all(|&x| (0.0..200.0).contains(&x)));
        assert!(world.y.iter().all(|&y| (0.0..100.0).contains(&y)));
        assert!(world.vx.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_not_started_does_not_step() {
        let mut core = core_with(&[10]);
        assert!(core.tick());
        assert_eq!(core.num_steps(), 0);
        assert_eq!(core.state(), RunState::NotStarted);
    }

    #[test]
    fn test_one_step_reverts_to_paused() {
        let mut core = core_with(&[10]);
        core.handle().push_command(Command::OneStep);
        assert!(core.tick());
        assert_eq!(core.num_steps(), 1);
        assert_eq!(core.state(), RunState::Paused);
        assert!(core.tick());
        assert_eq!(core.num_steps(), 1);
    }

    #[test]
    fn test_quit_discards_rest_of_batch() {
        let mut core = core_with(&[10]);
        let handle = core.handle();
        handle.push_command(Command::Quit);
        handle.push_command(Command::AddGroup {
            size: 5,
            color: Color::default(),
            radius2: 1.0,
        });
        assert!(!core.tick());
        assert_eq!(core.world().group_count(), 1);
        assert!(!core.tick());
    }

    #[test]
    fn test_out_of_range_edits_are_ignored() {
        let mut core = core_with(&[10, 10]);
        core.apply_command(Command::Resume);
        core.tick();
        let steps = core.num_steps();
        core.apply_command(Command::RemoveGroup { index: 9 });
        core.apply_command(Command::ResizeGroup { index: 2, new_size: 4 });
        core.apply_command(Command::AddGroup {
            size: 0,
            color: Color::default(),
            radius2: 1.0,
        });
        assert_eq!(core.world().group_count(), 2);
        assert_eq!(core.world().particle_count(), 20);
        assert_eq!(core.num_steps(), steps);
    }

    #[test]
    fn test_add_group_randomizes_new_particles() {
        let mut core = core_with(&[10]);
        core.apply_command(Command::AddGroup {
            size: 50,
            color: Color::palette(4),
            radius2: 64.0,
        });
        let world = core.world();
        assert_eq!(world.group_count(), 2);
        assert_eq!(world.radii2()[1], 64.0);
        assert!(world.x[10..].iter().any(|&x| x != 0.0));
        assert!(world.is_partitioned());
    }

    #[test]
    fn test_structural_edit_resets_step_counter() {
        let mut core = core_with(&[10, 10]);
        core.apply_command(Command::Resume);
        core.tick();
        core.tick();
        assert_eq!(core.num_steps(), 2);
        core.apply_command(Command::ResizeGroup { index: 0, new_size: 15 });
        assert_eq!(core.num_steps(), 0);
        assert_eq!(core.world().particle_count(), 25);
    }

    #[test]
    fn test_remove_all_groups() {
        let mut core = core_with(&[10, 10]);
        core.apply_command(Command::RemoveAllGroups);
        assert_eq!(core.world().group_count(), 0);
        assert_eq!(core.world().particle_count(), 0);
        core.apply_command(Command::Resume);
        assert!(core.tick());
    }

    #[test]
    fn test_reset_world_keeps_tables() {
        let mut core = core_with(&[10, 20]);
        let rules = core.world().rules().to_vec();
        let x0 = core.world().x.clone();
        core.apply_command(Command::ResetWorld);
        assert_eq!(core.world().rules(), rules.as_slice());
        assert_eq!(core.world().particle_count(), 30);
        assert_ne!(core.world().x, x0);
    }

    #[test]
    fn test_publish_exposes_snapshots() {
        let mut core = core_with(&[10, 20]);
        core.apply_command(Command::Resume);
        core.tick();
        let handle = core.handle();
        let stats = handle.get_stats();
        assert_eq!(stats.particles, 30);
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.num_steps, 1);
        assert_eq!(stats.threads, 2);
        let snap = handle.get_world_snapshot();
        assert_eq!(snap.group_count(), 2);
        assert_eq!(snap.particle_count(), 30);
        let view = handle.begin_read_draw();
        assert_eq!(view.curr.x, core.world().x);
        assert!(view.curr.grid.is_none());
        handle.end_read_draw(view);
    }

    #[test]
    fn test_grid_frame_only_when_requested() {
        let mut core = core_with(&[40]);
        let handle = core.handle();
        handle
            .update_config(ConfigSnapshot {
                report_grid: true,
                ..small_config()
            })
            .unwrap();
        core.tick();
        let view = handle.begin_read_draw();
        let grid = view.curr.grid.as_ref().expect("grid frame requested");
        assert_eq!(grid.counts.iter().sum::<u32>(), 40);
    }

    #[test]
    fn test_update_config_rejects_invalid() {
        let core = SimulationCore::standalone(small_config(), None).unwrap();
        let handle = core.handle();
        let bad = ConfigSnapshot {
            viscosity: -0.1,
            ..small_config()
        };
        assert!(handle.update_config(bad).is_err());
        assert_eq!(handle.get_config(), small_config());
    }

    #[test]
    fn test_seed_from_patch_overlays_live_tables() {
        let core = core_with(&[10, 20]);
        let patch = RulePatch {
            group_count: 3,
            sizes: vec![5],
            ..Default::default()
        };
        let seed = seed_from_patch(core.world(), &patch);
        assert_eq!(seed.sizes, vec![5, 20, 15]);
        assert_eq!(seed.rules.len(), 9);
        assert_eq!(seed.rules[1], core.world().rule(0, 1));
        assert_eq!(seed.rules[3], core.world().rule(1, 0));
        assert_eq!(seed.rules[2], 0.0);
        assert_eq!(seed.radii2[2], DEFAULT_RADIUS2);
    }

    #[test]
    fn test_engine_begin_twice_fails() {
        let mut engine = SimulationEngine::new(small_config()).unwrap();
        engine.begin().unwrap();
        assert!(matches!(engine.begin(), Err(SimError::EngineAlreadyStarted)));
        engine.end().unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period(0.0), None);
        assert_eq!(tick_period(-5.0), None);
        assert_eq!(tick_period(4.0), Some(Duration::from_millis(250)));
        assert_eq!(tick_period(1e-20), Some(MAX_TICK_PERIOD));
        assert_eq!(tick_period(f32::MIN_POSITIVE), Some(MAX_TICK_PERIOD));
    }

    #[test]
    fn test_deadlines_advance_without_drift() {
        let start = Instant::now();
        let period = Duration::from_millis(10);
        let (first, wait) = next_deadline(None, period, start);
        assert!(wait);
        assert_eq!(first, start + period);

        // woke late but before the next boundary: schedule stays absolute
        let late = first + Duration::from_millis(3);
        let (second, wait) = next_deadline(Some(first), period, late);
        assert!(wait);
        assert_eq!(second, start + 2 * period);
    }

    #[test]
    fn test_missed_deadline_resets_to_now() {
        let start = Instant::now();
        let period = Duration::from_millis(10);
        let now = start + Duration::from_millis(55);
        let (deadline, wait) = next_deadline(Some(start), period, now);
        assert!(!wait);
        assert_eq!(deadline, now);
        let (next, _) = next_deadline(Some(deadline), period, now);
        assert_eq!(next, now + period);
    }

    #[test]
    fn test_tiny_target_rate_keeps_engine_alive() {
        let config = ConfigSnapshot {
            target_tps: 1e-20,
            ..small_config()
        };
        assert!(config.validate().is_ok());
        let mut engine = SimulationEngine::with_rng_seed(config, 3).unwrap();
        engine.push_command(Command::SeedWorld(seed(&[10])));
        engine.begin().unwrap();
        thread::sleep(Duration::from_millis(300));
        assert!(engine.is_running());

        let asked = Instant::now();
        engine.end().unwrap();
        assert!(asked.elapsed() < Duration::from_secs(5));
    }
}
