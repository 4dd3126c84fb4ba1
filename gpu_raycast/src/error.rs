//! Error types of the ray casting pipeline

use thiserror::Error;

/// Errors raised by the resampling, baking and rendering stages.
#[derive(Error, Debug)]
pub enum RaycastError {
    /// The graphics context lacks a required feature.
    #[error("ray casting not supported: {0}")]
    Unsupported(String),

    /// Missing or malformed input (grid, property, option value).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Shader source failed to compile.
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompilation { stage: &'static str, log: String },

    /// Shader program failed to link.
    #[error("program link failed: {0}")]
    ProgramLink(String),

    /// A gradient worker thread panicked, the textures are incomplete.
    #[error("gradient estimation failed: {0}")]
    Gradient(String),

    /// Volume file header could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type RaycastResult<T> = std::result::Result<T, RaycastError>;

impl RaycastError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RaycastError::InvalidInput(msg.into())
    }
}
