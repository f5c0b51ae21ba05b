use particle_data::{Color, RulePatch, SeedSpec};
use serde::{Deserialize, Serialize};

/// Edits and control requests applied by the engine thread.
///
/// Commands are plain owned values: the producer gives one up on push and
/// the engine owns it after drain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Replace the world with a new seed and fresh random positions.
    SeedWorld(SeedSpec),
    /// Reseed from the current group tables.
    ResetWorld,
    Pause,
    Resume,
    /// Run exactly one step, then pause.
    OneStep,
    ApplyRules(RulePatch),
    AddGroup {
        size: usize,
        color: Color,
        radius2: f32,
    },
    RemoveGroup {
        index: usize,
    },
    RemoveAllGroups,
    ResizeGroup {
        index: usize,
        new_size: usize,
    },
    Quit,
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SeedWorld(_) => "seed_world",
            Self::ResetWorld => "reset_world",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::OneStep => "one_step",
            Self::ApplyRules(_) => "apply_rules",
            Self::AddGroup { .. } => "add_group",
            Self::RemoveGroup { .. } => "remove_group",
            Self::RemoveAllGroups => "remove_all_groups",
            Self::ResizeGroup { .. } => "resize_group",
            Self::Quit => "quit",
        }
    }
}
