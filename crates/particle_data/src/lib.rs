//! Plain payload types exchanged between the simulation core and its
//! collaborators (editor UI, persistence, renderers).

pub mod data;

pub use data::color::Color;
pub use data::seed::{RulePatch, SeedSpec};
pub use data::snapshot::{GroupInfo, StatsSnapshot, WorldSnapshot};
