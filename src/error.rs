//! Error types for the hyperplane tracking library

use thiserror::Error;

/// Result type alias for the tracking library
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors that can occur during training or tracking operations
#[derive(Error, Debug)]
pub enum TrackError {
    /// The regression would be underdetermined with this few samples.
    #[error("insufficient samples for regression: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    /// The template lacks the texture needed for a stable regression and
    /// must be reselected.
    #[error("template regression is ill-conditioned (condition {condition:.3e} exceeds threshold {threshold:.3e})")]
    IllConditionedTemplate { condition: f64, threshold: f64 },

    /// The warp became numerically singular.
    #[error("warp is numerically degenerate")]
    DegenerateWarp,

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
