//! Error types for arena generation
//!
//! The generation pipeline itself never fails once the configuration is
//! accepted; errors only come from rejected configuration and from the
//! diagnostic exporters.

/// Errors surfaced at the public boundary of the crate
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Footprint size must be positive and finite, got {size}")]
    InvalidFootprint { size: f32 },

    #[error("Complexity level {level} is outside the supported range {min}..={max}")]
    ComplexityOutOfRange { level: u8, min: u8, max: u8 },

    #[error("Invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image export error: {0}")]
    Image(#[from] image::ImageError),
}

impl ArenaError {
    pub(crate) fn setting(name: &'static str, reason: impl Into<String>) -> Self {
        ArenaError::InvalidSetting {
            name,
            reason: reason.into(),
        }
    }
}
