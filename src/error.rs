//! Error types for construction-time failures.
//!
//! Nothing in the per-tick simulation path returns these; they are raised
//! while loading configs and building tracks, before the loop starts.

use thiserror::Error;

/// Result type alias for config loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for track construction.
pub type TrackResult<T> = Result<T, TrackError>;

/// Errors raised while loading or validating a [`crate::config::VehicleConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read vehicle config: {0}")]
    Io(#[from] std::io::Error),

    /// The config is not valid JSON for the expected shape.
    #[error("malformed vehicle config: {0}")]
    Json(#[from] serde_json::Error),

    /// The config parsed but a value is out of range.
    #[error("invalid vehicle config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an out-of-range error.
    #[must_use]
    pub fn invalid(details: impl Into<String>) -> Self {
        Self::Invalid(details.into())
    }
}

/// Errors raised while building curves and racing lines.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Catmull-Rom needs four points to blend a segment.
    #[error("curve needs at least {min} control points, got {got}")]
    TooFewControlPoints { got: usize, min: usize },

    /// A racing line needs at least one speed target.
    #[error("racing line speed table is empty")]
    EmptySpeedTable,

    /// A racing line needs at least two samples.
    #[error("sample count must be at least {min}, got {got}")]
    InvalidSampleCount { got: usize, min: usize },
}
