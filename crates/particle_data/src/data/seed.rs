use super::color::Color;
use serde::{Deserialize, Serialize};

/// Interaction radius² used when a seed or patch leaves a group's radius unset.
pub const DEFAULT_RADIUS2: f32 = 80.0 * 80.0;
/// Particle count used for groups created by a patch without an explicit size.
pub const DEFAULT_GROUP_SIZE: usize = 500;

/// Full description of a world to (re)build from scratch.
///
/// All per-group arrays are parallel and indexed by group; `rules` is the
/// row-major `G×G` interaction matrix. This is the schema persistence and
/// the editor read and write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SeedSpec {
    pub sizes: Vec<usize>,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub radii2: Vec<f32>,
    #[serde(default)]
    pub enabled: Vec<bool>,
    #[serde(default)]
    pub rules: Vec<f32>,
}

impl SeedSpec {
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.sizes.len()
    }

    #[must_use]
    pub fn total_particles(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// Returns a copy whose per-group arrays and rule matrix exactly match
    /// the group count. Missing entries get palette colors, the default
    /// radius², `enabled = true` and zero rules; surplus entries are dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let g = self.group_count();
        let colors = (0..g)
            .map(|i| self.colors.get(i).copied().unwrap_or_else(|| Color::palette(i)))
            .collect();
        let radii2 = (0..g)
            .map(|i| self.radii2.get(i).copied().unwrap_or(DEFAULT_RADIUS2))
            .collect();
        let enabled = (0..g)
            .map(|i| self.enabled.get(i).copied().unwrap_or(true))
            .collect();
        let mut rules = self.rules.clone();
        rules.resize(g * g, 0.0);
        Self {
            sizes: self.sizes.clone(),
            colors,
            radii2,
            enabled,
            rules,
        }
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Edit of the group tables.
///
/// When `group_count` equals the live group count the patch is applied in
/// place; otherwise the engine synthesizes a full [`SeedSpec`] from the live
/// tables overlaid with this patch and reseeds. Arrays whose length does not
/// match `group_count` (or `group_count²` for `rules`) are ignored, except
/// `sizes`, which is read per index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RulePatch {
    pub group_count: usize,
    #[serde(default)]
    pub rules: Vec<f32>,
    #[serde(default)]
    pub radii2: Vec<f32>,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub enabled: Vec<bool>,
    /// Per-group sizes, consulted only when the patch changes the group
    /// count. Missing entries keep the live size.
    #[serde(default)]
    pub sizes: Vec<usize>,
}

impl RulePatch {
    #[must_use]
    pub fn has_rules(&self) -> bool {
        self.rules.len() == self.group_count * self.group_count
    }

    #[must_use]
    pub fn has_radii2(&self) -> bool {
        self.radii2.len() == self.group_count
    }

    #[must_use]
    pub fn has_colors(&self) -> bool {
        self.colors.len() == self.group_count
    }

    #[must_use]
    pub fn has_enabled(&self) -> bool {
        self.enabled.len() == self.group_count
    }
}
