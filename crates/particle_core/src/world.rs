//! Particle storage and group bookkeeping.
//!
//! Particles are stored as parallel arrays (structure of arrays). Groups own
//! contiguous, sorted, non-overlapping index ranges that partition
//! `[0, particle_count)`. Per-group tables (color, interaction radius²,
//! enabled flag) and the dense row-major `G×G` rule matrix are kept in sync
//! with the range table by every structural edit.
//!
//! Only the engine thread mutates a `ParticleWorld`; everyone else sees it
//! through [`WorldSnapshot`].

use crate::error::{Result, SimError};
use particle_data::data::seed::DEFAULT_RADIUS2;
use particle_data::{Color, GroupInfo, SeedSpec, WorldSnapshot};
use rand::Rng;
use std::ops::Range;

/// Half-open particle index range owned by one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupRange {
    pub start: usize,
    pub end: usize,
}

impl GroupRange {
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticleWorld {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    ranges: Vec<GroupRange>,
    colors: Vec<Color>,
    radius2: Vec<f32>,
    enabled: Vec<bool>,
    rules: Vec<f32>,
    particle_group: Vec<u32>,
}

impl ParticleWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a world from a seed. Positions and velocities are zero; call
    /// [`ParticleWorld::randomize_range`] to scatter particles.
    #[must_use]
    pub fn from_seed(seed: &SeedSpec) -> Self {
        let mut world = Self::new();
        world.populate(seed);
        world
    }

    /// Replaces every particle and table with the contents of `seed`.
    pub fn populate(&mut self, seed: &SeedSpec) {
        let seed = seed.normalized();
        self.clear();
        for (g, &size) in seed.sizes.iter().enumerate() {
            self.push_group(size, seed.colors[g]);
        }
        self.init_rule_tables(seed.group_count());
        self.radius2.copy_from_slice(&seed.radii2);
        self.enabled.copy_from_slice(&seed.enabled);
        self.rules.copy_from_slice(&seed.rules);
        self.finalize_groups();
    }

    /// Removes all particles and groups.
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.vx.clear();
        self.vy.clear();
        self.ranges.clear();
        self.colors.clear();
        self.radius2.clear();
        self.enabled.clear();
        self.rules.clear();
        self.particle_group.clear();
    }

    fn push_group(&mut self, count: usize, color: Color) -> usize {
        let start = self.x.len();
        let end = start + count;
        self.x.resize(end, 0.0);
        self.y.resize(end, 0.0);
        self.vx.resize(end, 0.0);
        self.vy.resize(end, 0.0);
        self.ranges.push(GroupRange { start, end });
        self.colors.push(color);
        self.ranges.len() - 1
    }

    /// Appends a group of `count` zero-initialized particles.
    ///
    /// The rule matrix grows by one zero row and column; existing rules keep
    /// their values. The new group gets the default radius² and starts
    /// enabled.
    pub fn add_group(&mut self, count: usize, color: Color) -> Result<usize> {
        if count == 0 {
            return Err(SimError::EmptyGroup);
        }
        let old_g = self.ranges.len();
        let index = self.push_group(count, color);
        let new_g = old_g + 1;

        let mut rules = vec![0.0; new_g * new_g];
        for i in 0..old_g {
            rules[i * new_g..i * new_g + old_g]
                .copy_from_slice(&self.rules[i * old_g..(i + 1) * old_g]);
        }
        self.rules = rules;
        self.radius2.push(DEFAULT_RADIUS2);
        self.enabled.push(true);
        Ok(index)
    }

    /// Erases a group's particles and table entries.
    ///
    /// Later ranges shift down by the removed count; row and column `index`
    /// are compacted out of the rule matrix so every other pair keeps its
    /// value under the renumbering.
    pub fn remove_group(&mut self, index: usize) -> Result<()> {
        let g = self.ranges.len();
        let range = self.group_range(index)?;
        let removed = range.len();

        self.x.drain(range.as_range());
        self.y.drain(range.as_range());
        self.vx.drain(range.as_range());
        self.vy.drain(range.as_range());

        self.ranges.remove(index);
        for r in &mut self.ranges[index..] {
            r.start -= removed;
            r.end -= removed;
        }
        self.colors.remove(index);
        self.radius2.remove(index);
        self.enabled.remove(index);

        let mut k = 0usize;
        self.rules.retain(|_| {
            let (i, j) = (k / g, k % g);
            k += 1;
            i != index && j != index
        });
        Ok(())
    }

    /// Grows or shrinks a group in place and returns the index range of any
    /// newly added (zero-initialized) particles.
    ///
    /// Growth appends at the end of the group's slice; shrinking erases from
    /// the end. Later ranges shift accordingly.
    pub fn resize_group(&mut self, index: usize, new_size: usize) -> Result<Range<usize>> {
        let range = self.group_range(index)?;
        let old_size = range.len();

        if new_size > old_size {
            let extra = new_size - old_size;
            let at = range.end;
            for arr in [&mut self.x, &mut self.y, &mut self.vx, &mut self.vy] {
                arr.splice(at..at, std::iter::repeat(0.0).take(extra));
            }
            self.ranges[index].end += extra;
            for r in &mut self.ranges[index + 1..] {
                r.start += extra;
                r.end += extra;
            }
            Ok(at..at + extra)
        } else {
            let cut = old_size - new_size;
            let from = range.start + new_size;
            for arr in [&mut self.x, &mut self.y, &mut self.vx, &mut self.vy] {
                arr.drain(from..range.end);
            }
            self.ranges[index].end -= cut;
            for r in &mut self.ranges[index + 1..] {
                r.start -= cut;
                r.end -= cut;
            }
            Ok(from..from)
        }
    }

    /// Rebuilds the particle→group lookup from the range table. Must run
    /// after any structural edit before [`ParticleWorld::group_of`] is used.
    pub fn finalize_groups(&mut self) {
        self.particle_group.clear();
        self.particle_group.reserve(self.x.len());
        for (g, r) in self.ranges.iter().enumerate() {
            self.particle_group
                .extend(std::iter::repeat(g as u32).take(r.len()));
        }
    }

    /// Resets the rule matrix to `g×g` zeros, radius² to zero and every
    /// group to enabled.
    pub fn init_rule_tables(&mut self, g: usize) {
        self.rules = vec![0.0; g * g];
        self.radius2 = vec![0.0; g];
        self.enabled = vec![true; g];
    }

    /// `sqrt(max(radius²))` over all groups, or `0` without groups.
    #[must_use]
    pub fn max_interaction_radius(&self) -> f32 {
        self.radius2
            .iter()
            .copied()
            .filter(|r2| r2.is_finite())
            .fold(0.0f32, f32::max)
            .sqrt()
    }

    /// Scatters `range` uniformly over `[0, width) × [0, height)` and zeroes
    /// its velocities.
    pub fn randomize_range<R: Rng>(
        &mut self,
        range: Range<usize>,
        width: f32,
        height: f32,
        rng: &mut R,
    ) {
        for i in range {
            self.x[i] = rng.gen::<f32>() * width;
            self.y[i] = rng.gen::<f32>() * height;
            self.vx[i] = 0.0;
            self.vy[i] = 0.0;
        }
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn group_range(&self, index: usize) -> Result<GroupRange> {
        self.ranges
            .get(index)
            .copied()
            .ok_or(SimError::GroupOutOfRange {
                index,
                count: self.ranges.len(),
            })
    }

    #[must_use]
    pub fn ranges(&self) -> &[GroupRange] {
        &self.ranges
    }

    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[must_use]
    pub fn radii2(&self) -> &[f32] {
        &self.radius2
    }

    #[must_use]
    pub fn enabled_flags(&self) -> &[bool] {
        &self.enabled
    }

    #[must_use]
    pub fn rules(&self) -> &[f32] {
        &self.rules
    }

    #[must_use]
    pub fn particle_groups(&self) -> &[u32] {
        &self.particle_group
    }

    #[inline]
    #[must_use]
    pub fn group_of(&self, i: usize) -> usize {
        self.particle_group[i] as usize
    }

    #[inline]
    #[must_use]
    pub fn rule(&self, i: usize, j: usize) -> f32 {
        self.rules[i * self.ranges.len() + j]
    }

    pub fn set_rule(&mut self, i: usize, j: usize, value: f32) -> Result<()> {
        let g = self.ranges.len();
        if i >= g || j >= g {
            return Err(SimError::GroupOutOfRange {
                index: i.max(j),
                count: g,
            });
        }
        self.rules[i * g + j] = value;
        Ok(())
    }

    /// Replaces the whole rule matrix; `rules` must hold exactly `G×G` values.
    pub fn set_rules(&mut self, rules: &[f32]) -> bool {
        if rules.len() != self.rules.len() {
            return false;
        }
        self.rules.copy_from_slice(rules);
        true
    }

    pub fn set_radius2(&mut self, index: usize, radius2: f32) -> Result<()> {
        self.group_range(index)?;
        self.radius2[index] = radius2;
        Ok(())
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<()> {
        self.group_range(index)?;
        self.enabled[index] = enabled;
        Ok(())
    }

    pub fn set_color(&mut self, index: usize, color: Color) -> Result<()> {
        self.group_range(index)?;
        self.colors[index] = color;
        Ok(())
    }

    /// True when the ranges are sorted, contiguous and cover every particle.
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        let mut cursor = 0;
        for r in &self.ranges {
            if r.start != cursor || r.end < r.start {
                return false;
            }
            cursor = r.end;
        }
        let n = self.x.len();
        cursor == n
            && self.y.len() == n
            && self.vx.len() == n
            && self.vy.len() == n
            && self.rules.len() == self.ranges.len() * self.ranges.len()
    }

    /// Seed that would rebuild the current group tables.
    #[must_use]
    pub fn to_seed(&self) -> SeedSpec {
        SeedSpec {
            sizes: self.ranges.iter().map(GroupRange::len).collect(),
            colors: self.colors.clone(),
            radii2: self.radius2.clone(),
            enabled: self.enabled.clone(),
            rules: self.rules.clone(),
        }
    }

    #[must_use]
    pub fn snapshot(&self, num_steps: u64) -> WorldSnapshot {
        let groups = self
            .ranges
            .iter()
            .enumerate()
            .map(|(g, r)| GroupInfo {
                start: r.start,
                end: r.end,
                color: self.colors[g],
                radius2: self.radius2[g],
                enabled: self.enabled[g],
            })
            .collect();
        WorldSnapshot {
            groups,
            rules: self.rules.clone(),
            particle_group: self.particle_group.clone(),
            num_steps,
        }
    }
}
