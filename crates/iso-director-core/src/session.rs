//! Session state for one recording attempt.
//!
//! A [`Session`] is a plain data holder. Only the crate's state machine
//! (orchestrator, EDL builder, handover) moves it between statuses, so the
//! invariants below hold for every value a caller can observe:
//!
//! - `session_id` is present only for Iso sessions that have started.
//! - the EDL only grows while `status == Recording`.
//! - `stream_id` is fixed once the session leaves `Idle`.
//! - `started_at` and `stopped_at` are each set at most once.

use crate::{Edl, SignalKind};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Which kind of recording the console is driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// One combined program output. No EDL handover.
    #[default]
    Legacy,
    /// Every camera recorded separately, stitched later from the EDL.
    Iso,
}

impl RecordingMode {
    /// Signal that asks the capture backend to begin recording in this mode.
    pub fn start_signal(self) -> SignalKind {
        match self {
            RecordingMode::Legacy => SignalKind::Start,
            RecordingMode::Iso => SignalKind::StartIso,
        }
    }

    /// Signal that asks the capture backend to stop recording in this mode.
    pub fn stop_signal(self) -> SignalKind {
        match self {
            RecordingMode::Legacy => SignalKind::Stop,
            RecordingMode::Iso => SignalKind::StopIso,
        }
    }
}

/// Lifecycle status of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Not recording. Either fresh, or a finished legacy session.
    Idle,
    /// Start signaled, acknowledgement pending.
    Starting,
    /// Recording; EDL entries are accepted.
    Recording,
    /// Iso stop signaled, waiting for the handover to persist.
    Stopping,
    /// Iso data persisted and handed to the Download Manager.
    HandedOff,
}

/// One recording attempt.
#[derive(Debug, Clone)]
pub struct Session {
    mode: RecordingMode,
    stream_id: String,
    has_active_source: bool,
    status: SessionStatus,
    session_id: Option<Uuid>,
    edl: Edl,
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
}

impl Session {
    /// Create an idle session for `mode` addressing room `stream_id`.
    pub fn new(mode: RecordingMode, stream_id: impl Into<String>) -> Self {
        Self {
            mode,
            stream_id: stream_id.into(),
            has_active_source: false,
            status: SessionStatus::Idle,
            session_id: None,
            edl: Edl::default(),
            started_at: None,
            stopped_at: None,
        }
    }

    /// Fresh idle session with the same mode, room and source signal.
    pub fn successor(&self) -> Self {
        let mut next = Self::new(self.mode, self.stream_id.clone());
        next.has_active_source = self.has_active_source;
        next
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn has_active_source(&self) -> bool {
        self.has_active_source
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Iso session identifier, assigned when the Iso start succeeds.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn edl(&self) -> &Edl {
        &self.edl
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<Instant> {
        self.stopped_at
    }

    /// Recorded length, once the session has been stopped.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => Some(stop.saturating_duration_since(start)),
            _ => None,
        }
    }

    /// Whether the session has run its course and must be replaced before
    /// another start.
    pub fn is_finished(&self) -> bool {
        match self.status {
            SessionStatus::HandedOff => true,
            SessionStatus::Idle => self.started_at.is_some(),
            _ => false,
        }
    }

    /// Whether the session is between a start and its final state.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Starting | SessionStatus::Recording | SessionStatus::Stopping
        )
    }

    pub(crate) fn set_active_source(&mut self, active: bool) {
        self.has_active_source = active;
    }

    pub(crate) fn edl_mut(&mut self) -> &mut Edl {
        &mut self.edl
    }

    pub(crate) fn begin_starting(&mut self, session_id: Option<Uuid>, now: Instant) {
        self.session_id = session_id;
        self.started_at.get_or_insert(now);
        self.status = SessionStatus::Starting;
    }

    pub(crate) fn mark_recording(&mut self) {
        self.status = SessionStatus::Recording;
    }

    /// Fix `stopped_at`, never earlier than the last EDL entry.
    pub(crate) fn finalize_stop(&mut self, now: Instant) {
        if self.stopped_at.is_some() {
            return;
        }
        let last_entry = match (self.started_at, self.edl.last()) {
            (Some(start), Some(entry)) => Some(start + entry.timestamp),
            _ => None,
        };
        self.stopped_at = Some(match last_entry {
            Some(last) if last > now => last,
            _ => now,
        });
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }
}
