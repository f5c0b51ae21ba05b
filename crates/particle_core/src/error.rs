//! Error types for the simulation core.
//!
//! Configuration errors and lifecycle misuse are surfaced to the caller;
//! structural edits that reference a missing group are reported here but
//! ignored by the engine.

use thiserror::Error;

/// Main error type for particle_core operations.
#[derive(Error, Debug)]
pub enum SimError {
    /// Rejected configuration values (never silently clamped)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Group index outside `[0, group_count)`
    #[error("Group index {index} out of range (group count {count})")]
    GroupOutOfRange { index: usize, count: usize },

    /// A group must contain at least one particle when created
    #[error("Group size must be positive")]
    EmptyGroup,

    #[error("Worker pool already started")]
    PoolAlreadyStarted,

    #[error("Worker pool not started")]
    PoolNotStarted,

    /// rayon could not create the worker threads
    #[error("Worker pool build error: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    #[error("Engine already started")]
    EngineAlreadyStarted,

    #[error("Engine thread panicked")]
    EngineThreadPanicked,

    /// OS refused to spawn a thread
    #[error("Thread spawn error: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias for particle_core operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for errors the engine treats as a silent no-op.
    #[must_use]
    pub fn is_structural_noop(&self) -> bool {
        matches!(self, Self::GroupOutOfRange { .. } | Self::EmptyGroup)
    }
}
