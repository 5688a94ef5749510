//! Error types for the avatar
//!
//! Media failures are kept separate from application errors so the
//! controller can log them without unwinding the cycle.

use thiserror::Error;

/// Failures reported by a playback surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The surface refused to start playback (e.g. autoplay policy)
    #[error("{surface} playback rejected: {reason}")]
    PlaybackRejected { surface: String, reason: String },

    /// The surface could not buffer enough data to play
    #[error("{surface} failed to load: {reason}")]
    LoadFailed { surface: String, reason: String },

    /// The pending load was dropped before it resolved
    #[error("{surface} load was aborted")]
    LoadAborted { surface: String },
}

/// Avatar application errors
#[derive(Error, Debug, Clone)]
pub enum AvatarError {
    /// Playback surface error
    #[error("Media error: {0}")]
    MediaError(#[from] MediaError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Scenario file could not be loaded or is invalid
    #[error("Scenario error: {0}")]
    ScenarioError(String),

    /// A file could not be read
    #[error("IO error: {0}")]
    IOError(String),

    /// Window or rendering backend error
    #[error("UI error: {0}")]
    UiError(String),
}

impl AvatarError {
    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            AvatarError::MediaError(MediaError::PlaybackRejected { .. }) => {
                "Playback was blocked, the avatar keeps its current video.".to_string()
            }
            AvatarError::MediaError(_) => {
                "The response video could not be loaded. Please try again.".to_string()
            }
            AvatarError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            AvatarError::ScenarioError(_) => {
                "Scenario file is invalid.".to_string()
            }
            AvatarError::IOError(_) => "File system error occurred.".to_string(),
            AvatarError::UiError(_) => "Failed to open the window.".to_string(),
        }
    }
}

/// Result type alias for avatar operations
pub type Result<T> = std::result::Result<T, AvatarError>;
