use thiserror::Error;

/// Errors that can occur while loading or checking Haze data.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
