pub mod macros;

use particle_core::physics::{self, ForceBuffers, StepParams};
use particle_core::{ConfigSnapshot, ParticleWorld, SpatialGrid, WorkerPool};
use particle_data::{Color, SeedSpec};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

/// Small, unthrottled configuration used across integration tests.
#[allow(dead_code)]
pub fn test_config() -> ConfigSnapshot {
    ConfigSnapshot {
        bounds_width: 400.0,
        bounds_height: 300.0,
        target_tps: 0.0,
        threads: 2,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub struct WorldBuilder {
    seed: SeedSpec,
    particles: Vec<(usize, f32, f32, f32, f32)>,
    scatter: Option<(f32, f32, u64)>,
}

#[allow(dead_code)]
impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            seed: SeedSpec::default(),
            particles: Vec::new(),
            scatter: None,
        }
    }

    /// Adds a group with the given size and radius², enabled, palette color.
    pub fn with_group(mut self, size: usize, radius2: f32) -> Self {
        let g = self.seed.sizes.len();
        self.seed.sizes.push(size);
        self.seed.colors.push(Color::palette(g));
        self.seed.radii2.push(radius2);
        self.seed.enabled.push(true);
        self
    }

    pub fn with_disabled(mut self, group: usize) -> Self {
        self.seed.enabled[group] = false;
        self
    }

    /// Sets `rules[i][j]`; call after all groups have been added.
    pub fn with_rule(mut self, i: usize, j: usize, value: f32) -> Self {
        let g = self.seed.sizes.len();
        self.seed.rules.resize(g * g, 0.0);
        self.seed.rules[i * g + j] = value;
        self
    }

    /// Places particle `i` at `(x, y)` with velocity `(vx, vy)`.
    pub fn with_particle(mut self, i: usize, x: f32, y: f32, vx: f32, vy: f32) -> Self {
        self.particles.push((i, x, y, vx, vy));
        self
    }

    /// Scatters every particle uniformly before explicit placements.
    pub fn scattered(mut self, width: f32, height: f32, rng_seed: u64) -> Self {
        self.scatter = Some((width, height, rng_seed));
        self
    }

    pub fn seed(&self) -> SeedSpec {
        self.seed.normalized()
    }

    pub fn build(self) -> ParticleWorld {
        let mut world = ParticleWorld::from_seed(&self.seed);
        if let Some((w, h, s)) = self.scatter {
            let mut rng = ChaCha8Rng::seed_from_u64(s);
            let n = world.particle_count();
            world.randomize_range(0..n, w, h, &mut rng);
        }
        for (i, x, y, vx, vy) in self.particles {
            world.x[i] = x;
            world.y[i] = y;
            world.vx[i] = vx;
            world.vy[i] = vy;
        }
        world
    }
}

/// Rebuilds the grid and runs one physics step, the way the engine does.
#[allow(dead_code)]
pub fn step_world(world: &mut ParticleWorld, config: &ConfigSnapshot, pool: &WorkerPool) {
    let params = StepParams::from(config);
    let n = world.particle_count();
    let mut grid = SpatialGrid::new();
    grid.resize(
        params.width,
        params.height,
        world.max_interaction_radius(),
        n,
    );
    grid.build(n, |i| world.x[i], |i| world.y[i]);
    let mut buffers = ForceBuffers::default();
    physics::step(world, &grid, pool, &mut buffers, &params);
}

/// Polls `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn wait_until<F: FnMut() -> bool>(timeout: Duration, mut condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
