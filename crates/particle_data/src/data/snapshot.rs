use super::color::Color;
use serde::{Deserialize, Serialize};

/// Engine statistics published once per engine iteration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsSnapshot {
    /// Steps per second measured over the last completed ~1s window.
    pub effective_tps: f32,
    pub particles: usize,
    pub groups: usize,
    pub threads: usize,
    /// Wall time of the most recent physics step, in milliseconds.
    pub last_step_ms: f32,
    /// Steps since the last reseed or structural edit.
    pub num_steps: u64,
    /// Engine clock (seconds since engine creation) at publish time.
    pub published_at: f64,
}

/// Read-only view of one group's table entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GroupInfo {
    pub start: usize,
    pub end: usize,
    pub color: Color,
    pub radius2: f32,
    pub enabled: bool,
}

impl GroupInfo {
    #[must_use]
    pub fn size(&self) -> usize {
        self.end - self.start
    }
}

/// Immutable copy of the world's bookkeeping, taken once per tick.
///
/// Carries no positions; those travel through the draw buffer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct WorldSnapshot {
    pub groups: Vec<GroupInfo>,
    /// Row-major `G×G` rule matrix.
    pub rules: Vec<f32>,
    /// Group index of every particle.
    pub particle_group: Vec<u32>,
    pub num_steps: u64,
}

impl WorldSnapshot {
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particle_group.len()
    }

    #[must_use]
    pub fn rule(&self, i: usize, j: usize) -> Option<f32> {
        let g = self.groups.len();
        if i < g && j < g {
            self.rules.get(i * g + j).copied()
        } else {
            None
        }
    }
}
