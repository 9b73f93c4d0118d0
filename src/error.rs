//! Error types for the simulation and its physics boundary

use thiserror::Error;

use crate::physics::BodyHandle;

/// Contract violations against the physics world
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Handle does not name a live body (destroyed twice, or never created)
    #[error("unknown body handle: {0:?}")]
    UnknownBody(BodyHandle),
    /// Step called with a non-positive or non-finite timestep
    #[error("invalid timestep: {0}")]
    InvalidTimestep(f32),
}

/// Errors surfaced by round setup and the tick loop
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    /// Level JSON could not be decoded
    #[error("level parse error: {0}")]
    LevelParse(#[source] serde_json::Error),
    /// Tuning JSON could not be decoded
    #[error("tuning parse error: {0}")]
    TuningParse(#[source] serde_json::Error),
    /// Saved progress could not be decoded
    #[error("progress parse error: {0}")]
    ProgressParse(#[source] serde_json::Error),
    /// No built-in level with this number
    #[error("unknown level: {0}")]
    UnknownLevel(u32),
    /// Level data that cannot produce a playable round
    #[error("invalid level: {0}")]
    InvalidLevel(String),
}
