//! Custom error types for the application

use thiserror::Error;

/// Application-specific error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Microphone missing or refused
    #[error("Microphone unavailable: {0}")]
    CapabilityDenied(String),

    /// Audio device related errors
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Audio stream related errors
    #[error("Audio stream error: {0}")]
    AudioStream(String),

    /// Start requested while a session is still open
    #[error("Audio stream error: already listening")]
    AlreadyListening,

    /// Invalid command line options
    #[error("Configuration error: {0}")]
    Config(String),

    /// Subscriber or log file setup failed
    #[error("Logging error: {0}")]
    Logging(String),

    /// General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for AppError {
    fn from(err: cpal::DevicesError) -> Self {
        AppError::AudioDevice(format!("Failed to enumerate devices: {}", err))
    }
}

impl From<cpal::DeviceNameError> for AppError {
    fn from(err: cpal::DeviceNameError) -> Self {
        AppError::AudioDevice(format!("Failed to get device name: {}", err))
    }
}

impl From<cpal::DefaultStreamConfigError> for AppError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AppError::AudioDevice(format!("Failed to get default stream config: {}", err))
    }
}

impl From<cpal::SupportedStreamConfigsError> for AppError {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        AppError::AudioDevice(format!("Failed to get supported stream configs: {}", err))
    }
}

impl From<cpal::BuildStreamError> for AppError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AppError::AudioStream(format!("Failed to build audio stream: {}", err))
    }
}

impl From<cpal::PlayStreamError> for AppError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AppError::AudioStream(format!("Failed to play audio stream: {}", err))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_denied_message() {
        let err = AppError::CapabilityDenied("no default input device".to_string());
        assert_eq!(
            err.to_string(),
            "Microphone unavailable: no default input device"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
