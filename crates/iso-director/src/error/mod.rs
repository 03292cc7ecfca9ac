use iso_director_core::{HandoverError, StartRejection, StopError};

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the iso-director binary.
///
/// All variants include `ErrorLocation` for call-site tracking.
#[derive(Error, Debug)]
pub enum AppError {
    /// The Mode Controller refused to start recording.
    #[error("Start rejected: {source} {location}")]
    StartRejected {
        /// The underlying rejection.
        #[source]
        source: StartRejection,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Stopping the recording failed.
    #[error("Stop failed: {source} {location}")]
    StopFailed {
        /// The underlying stop error.
        #[source]
        source: StopError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Retrying the handover failed.
    #[error("Handover failed: {source} {location}")]
    HandoverFailed {
        /// The underlying handover error.
        #[source]
        source: HandoverError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Operator input could not be understood.
    #[error("Invalid command {input:?}: {reason} {location}")]
    InvalidCommand {
        /// The raw input line.
        input: String,
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to send message through async channel.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The signaling endpoint could not be served.
    #[error("Signaling server error: {reason} {location}")]
    ServerError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading or saving error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem or terminal operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

// Manual From impls with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<StartRejection> for AppError {
    #[track_caller]
    fn from(source: StartRejection) -> Self {
        AppError::StartRejected {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<StopError> for AppError {
    #[track_caller]
    fn from(source: StopError) -> Self {
        AppError::StopFailed {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<HandoverError> for AppError {
    #[track_caller]
    fn from(source: HandoverError) -> Self {
        AppError::HandoverFailed {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
