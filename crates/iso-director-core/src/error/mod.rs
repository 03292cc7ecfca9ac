use crate::{RecordingMode, SessionStatus};

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Reasons the Mode Controller refuses to let a session start recording.
///
/// Returned synchronously to the operator; no session state is mutated and
/// no signal is emitted when a start is rejected.
#[derive(Error, Debug)]
pub enum StartRejection {
    /// Legacy mode (or Iso with the source policy enabled) needs a live camera.
    #[error("No source selected {location}")]
    NoSourceSelected {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Iso mode needs a room to address on the signaling channel.
    #[error("Missing stream id {location}")]
    MissingStreamId {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Another session is still in flight, here or elsewhere in the console.
    #[error("A session is already active ({status:?}) {location}")]
    SessionAlreadyActive {
        /// Status of the session holding the console.
        status: SessionStatus,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Errors from stopping a recording.
#[derive(Error, Debug)]
pub enum StopError {
    /// Stop was requested while nothing was being recorded.
    #[error("Not recording (status {status:?}) {location}")]
    NotRecording {
        /// Status at the time of the request.
        status: SessionStatus,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The Iso stop path reached the Handover Protocol and it failed.
    ///
    /// The session stays in `Stopping`; use `retry_handover` to try again.
    #[error("Handover failed: {source} {location}")]
    Handover {
        /// The underlying handover error.
        #[source]
        source: HandoverError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Errors from the Handover Protocol.
#[derive(Error, Debug)]
pub enum HandoverError {
    /// The persisted store refused the write. Nothing was navigated.
    #[error("Failed to persist handover: {source} {location}")]
    PersistFailed {
        /// The underlying store error.
        #[source]
        source: StoreError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Handover only applies to an Iso session that is `Stopping`.
    #[error("Handover not valid for {mode:?} session in {status:?} {location}")]
    InvalidState {
        /// Mode of the session.
        mode: RecordingMode,
        /// Status of the session.
        status: SessionStatus,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Errors from a persisted cross-page store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem failure while reading or writing the store.
    #[error("Store IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Stored content could not be encoded or decoded.
    #[error("Store serialization error: {source} {location}")]
    Serialization {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The store cannot accept writes (quota exceeded, disabled, ...).
    #[error("Store unavailable: {reason} {location}")]
    Unavailable {
        /// Human-readable reason.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Errors from emitting on the signaling channel.
///
/// The orchestrator logs these and carries on; they never block local state.
#[derive(Error, Debug)]
pub enum SignalError {
    /// No capture backend transport is attached to the channel.
    #[error("No signaling transport for event {event} {location}")]
    NoTransport {
        /// Wire name of the event that was dropped.
        event: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

// Manual From impls with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<std::io::Error> for StoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        StoreError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        StoreError::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<HandoverError> for StopError {
    #[track_caller]
    fn from(source: HandoverError) -> Self {
        StopError::Handover {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`StartRejection`].
pub type StartResult<T> = std::result::Result<T, StartRejection>;
