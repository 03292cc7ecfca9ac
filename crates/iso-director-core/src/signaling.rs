//! Signaling channel contract towards the capture backend.
//!
//! Events are room-scoped and fire-and-forget. The backend may answer with an
//! advisory acknowledgement, which the orchestrator treats as a hint only.

use crate::SignalError;

use std::{fmt, panic::Location};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, instrument};

/// Capacity of the in-process broadcast channel.
///
/// Start and stop are a handful of events per session; a lagging transport
/// only ever needs the most recent ones.
const BROADCAST_CAPACITY: usize = 64;

/// Start/stop events understood by the capture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Begin recording the combined program output.
    #[serde(rename = "start")]
    Start,
    /// Stop recording the combined program output.
    #[serde(rename = "stop")]
    Stop,
    /// Begin recording each camera in isolation.
    #[serde(rename = "start-iso")]
    StartIso,
    /// Stop the isolated recordings.
    #[serde(rename = "stop-iso")]
    StopIso,
}

impl SignalKind {
    /// Event name on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            SignalKind::Start => "start",
            SignalKind::Stop => "stop",
            SignalKind::StartIso => "start-iso",
            SignalKind::StopIso => "stop-iso",
        }
    }

    pub fn is_start(self) -> bool {
        matches!(self, SignalKind::Start | SignalKind::StartIso)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Payload of every start/stop event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
    /// Stream id of the room being recorded.
    pub room: String,
}

/// A start/stop event addressed to one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    /// Which event.
    #[serde(rename = "event")]
    pub kind: SignalKind,
    /// `{room}` payload.
    pub payload: RoomPayload,
}

impl SignalEvent {
    pub fn new(kind: SignalKind, room: impl Into<String>) -> Self {
        Self {
            kind,
            payload: RoomPayload { room: room.into() },
        }
    }

    pub fn room(&self) -> &str {
        &self.payload.room
    }
}

/// Acknowledgement sent back by the capture backend.
///
/// Advisory only: applied when it matches the current session, ignored
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalAck {
    /// Event being acknowledged.
    #[serde(rename = "event")]
    pub kind: SignalKind,
    /// Room the backend acted on.
    pub room: String,
}

/// Emit side of the signaling channel.
///
/// `emit` must not block. Failures are reported so they can be logged, but
/// callers do not gate local state on them.
pub trait SignalingChannel {
    /// Send `event` towards the capture backend.
    fn emit(&self, event: &SignalEvent) -> Result<(), SignalError>;
}

/// In-process fan-out of signal events to any attached transports.
#[derive(Debug, Clone)]
pub struct BroadcastSignaling {
    tx: broadcast::Sender<SignalEvent>,
}

impl BroadcastSignaling {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Attach a transport. Each subscriber sees every event emitted after
    /// it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<SignalEvent> {
        self.tx.subscribe()
    }

    pub fn transport_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSignaling {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingChannel for BroadcastSignaling {
    #[track_caller]
    #[instrument(skip(self, event), fields(event = %event.kind, room = %event.room()))]
    fn emit(&self, event: &SignalEvent) -> Result<(), SignalError> {
        let delivered = self
            .tx
            .send(event.clone())
            .map_err(|_| SignalError::NoTransport {
                event: event.kind.wire_name(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(transports = delivered, "Signal emitted");

        Ok(())
    }
}
