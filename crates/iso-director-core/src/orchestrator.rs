//! Recording Orchestrator: the session state machine.
//!
//! Drives start/stop for Legacy and Iso sessions, stamps EDL entries against
//! its elapsed-time counter, tells the capture backend what is happening, and
//! hands finished Iso sessions over to the Download Manager.
//!
//! All methods take `&mut self` and complete without waiting on the network,
//! so operator actions and backend acknowledgements are applied one at a time
//! in arrival order.

use crate::{
    EdlBuilder, Handover, HandoverError, HandoverReceipt, HandoverStore, ModeController,
    Navigator, RecordTimer, RecordingMode, Session, SessionStatus, SignalAck, SignalEvent,
    SignalKind, SignalingChannel, StartRejection, StartResult, StopError,
    mode::SlotClaim,
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::{sync::watch, time::Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Default interval at which the elapsed time is published for display.
pub const DEFAULT_TIMER_TICK: Duration = Duration::from_secs(1);

/// Orchestrator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Stay in `Starting` until the backend acknowledges the start signal.
    ///
    /// Off by default: the start is treated as optimistic and the session
    /// records immediately.
    pub await_start_ack: bool,
    /// Display tick of the elapsed-time counter.
    pub timer_tick: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            await_start_ack: false,
            timer_tick: DEFAULT_TIMER_TICK,
        }
    }
}

/// Summary of a Legacy session that finished inside the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Room that was recorded.
    pub stream_id: String,
    /// Time between start and stop.
    pub duration: Duration,
    /// Camera selections made while recording.
    pub edl_entries: usize,
}

/// What a successful stop led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Legacy: recording stopped, console is idle again.
    Finished(SessionSummary),
    /// Iso: data persisted and the Download Manager opened.
    HandedOff(HandoverReceipt),
}

/// Owns the console's current [`Session`] and everything that acts on it.
pub struct Orchestrator<C, S, N> {
    session: Session,
    controller: ModeController,
    signaling: C,
    handover: Handover<S, N>,
    config: OrchestratorConfig,
    timer: Option<RecordTimer>,
    claim: Option<SlotClaim>,
    elapsed_tx: watch::Sender<Duration>,
    /// Start acks still owed for sessions canceled while `Starting`.
    canceled_starts: Vec<SignalAck>,
}

impl<C, S, N> Orchestrator<C, S, N>
where
    C: SignalingChannel,
    S: HandoverStore,
    N: Navigator,
{
    pub fn new(
        session: Session,
        controller: ModeController,
        signaling: C,
        handover: Handover<S, N>,
        config: OrchestratorConfig,
    ) -> Self {
        let (elapsed_tx, _) = watch::channel(Duration::ZERO);
        Self {
            session,
            controller,
            signaling,
            handover,
            config,
            timer: None,
            claim: None,
            elapsed_tx,
            canceled_starts: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn signaling(&self) -> &C {
        &self.signaling
    }

    pub fn handover(&self) -> &Handover<S, N> {
        &self.handover
    }

    /// Elapsed recording time as published by the counter.
    pub fn subscribe_elapsed(&self) -> watch::Receiver<Duration> {
        self.elapsed_tx.subscribe()
    }

    /// Time recorded so far, or the final duration once stopped.
    pub fn elapsed(&self) -> Duration {
        match (&self.timer, self.session.duration()) {
            (Some(timer), _) => timer.elapsed(),
            (None, Some(duration)) => duration,
            (None, None) => Duration::ZERO,
        }
    }

    /// Whether the elapsed-time counter is running.
    pub fn is_timing(&self) -> bool {
        self.timer.is_some()
    }

    /// Switch recording mode. Starts a new session since a session's mode
    /// never changes.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_mode(&mut self, mode: RecordingMode) -> StartResult<()> {
        self.ensure_not_in_flight()?;
        if self.session.mode() != mode || self.session.is_finished() {
            let mut next = Session::new(mode, self.session.stream_id());
            next.set_active_source(self.session.has_active_source());
            self.session = next;
            info!(mode = ?mode, "Recording mode changed");
        }
        Ok(())
    }

    /// Address a different room. Only allowed before recording starts.
    #[track_caller]
    #[instrument(skip(self, stream_id))]
    pub fn set_stream_id(&mut self, stream_id: impl Into<String>) -> StartResult<()> {
        self.ensure_not_in_flight()?;
        let stream_id = stream_id.into();
        if self.session.stream_id() != stream_id || self.session.is_finished() {
            let mut next = Session::new(self.session.mode(), stream_id);
            next.set_active_source(self.session.has_active_source());
            self.session = next;
            info!(room = %self.session.stream_id(), "Stream id changed");
        }
        Ok(())
    }

    /// Upstream camera-selection signal.
    pub fn set_active_source(&mut self, active: bool) {
        self.session.set_active_source(active);
        debug!(active, "Active source updated");
    }

    /// Validate a start without performing it.
    pub fn can_start(&self) -> StartResult<()> {
        if self.session.is_finished() {
            self.controller.can_start(&self.session.successor())
        } else {
            self.controller.can_start(&self.session)
        }
    }

    /// Start recording the current session.
    ///
    /// A finished session is first replaced by a fresh one with the same
    /// mode and room. On rejection nothing is signaled and the session stays
    /// `Idle`.
    #[track_caller]
    #[instrument(skip(self), fields(mode = ?self.session.mode(), room = %self.session.stream_id()))]
    pub fn start(&mut self) -> StartResult<&Session> {
        if self.session.is_finished() {
            self.session = self.session.successor();
            debug!("Previous session finished, starting a new one");
        }

        let location = Location::caller();
        self.controller.can_start(&self.session)?;

        let claim = self.controller.slot().try_claim().ok_or_else(|| {
            StartRejection::SessionAlreadyActive {
                status: SessionStatus::Recording,
                location: ErrorLocation::from(location),
            }
        })?;

        let session_id = match self.session.mode() {
            RecordingMode::Legacy => None,
            RecordingMode::Iso => Some(Uuid::new_v4()),
        };

        let now = Instant::now();
        self.session.begin_starting(session_id, now);
        self.claim = Some(claim);

        self.emit(self.session.mode().start_signal());

        if let Some(mut stale) = self.timer.take() {
            warn!("Record timer from a previous session still running, canceling it");
            stale.cancel();
        }
        self.timer = Some(RecordTimer::start(
            now,
            self.config.timer_tick,
            self.elapsed_tx.clone(),
        ));

        if self.config.await_start_ack {
            info!(session_id = ?session_id, "Recording starting, awaiting acknowledgement");
        } else {
            self.session.mark_recording();
            info!(session_id = ?session_id, "Recording started");
        }

        Ok(&self.session)
    }

    /// Record that `selected_stream_ref` went live.
    ///
    /// Ignored (and logged) unless the session is recording.
    pub fn select_source(&mut self, selected_stream_ref: &str) -> Option<Duration> {
        EdlBuilder::record(&mut self.session, selected_stream_ref)
    }

    /// Stop recording.
    ///
    /// The elapsed-time counter is canceled before anything else, so no EDL
    /// entry can follow `stopped_at`. Signal failures are logged and do not
    /// block the local stop.
    ///
    /// For Iso sessions this runs the Handover Protocol, which navigates away
    /// from the console. In a page context that unloads the caller, so a
    /// return is only observed when the handover failed; the session is then
    /// left in `Stopping` for [`retry_handover`](Self::retry_handover).
    ///
    /// A session still waiting for its start acknowledgement is canceled
    /// through the same path.
    #[track_caller]
    #[instrument(skip(self), fields(mode = ?self.session.mode(), room = %self.session.stream_id()))]
    pub fn stop(&mut self) -> Result<StopOutcome, StopError> {
        let status = self.session.status();
        if !matches!(status, SessionStatus::Recording | SessionStatus::Starting) {
            return Err(StopError::NotRecording {
                status,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }

        if status == SessionStatus::Starting {
            info!("Stop requested before start was acknowledged, canceling");
            self.canceled_starts.push(SignalAck {
                kind: self.session.mode().start_signal(),
                room: self.session.stream_id().to_string(),
            });
        }

        match self.session.mode() {
            RecordingMode::Legacy => Ok(StopOutcome::Finished(self.stop_legacy())),
            RecordingMode::Iso => Ok(StopOutcome::HandedOff(self.stop_iso()?)),
        }
    }

    /// Re-run the handover for a session left in `Stopping`.
    ///
    /// No signal is emitted again.
    #[instrument(skip(self))]
    pub fn retry_handover(&mut self) -> Result<HandoverReceipt, HandoverError> {
        self.run_handover()
    }

    /// Apply an advisory acknowledgement from the capture backend.
    ///
    /// Returns whether it changed anything. Acknowledgements for another room,
    /// another mode, or a status the session has already left are ignored.
    ///
    /// Acks carry no session id, so the first matching ack after a canceled
    /// start is taken to answer that start and is dropped, even if a new
    /// session in the same room is already waiting.
    #[instrument(skip(self), fields(event = %ack.kind, room = %ack.room))]
    pub fn acknowledge(&mut self, ack: &SignalAck) -> bool {
        if let Some(owed) = self.canceled_starts.iter().position(|c| c == ack) {
            self.canceled_starts.remove(owed);
            debug!(
                still_owed = self.canceled_starts.len(),
                "Ignoring acknowledgement for a canceled start"
            );
            return false;
        }

        let status = self.session.status();
        let expected = self.session.mode().start_signal();

        let applies = ack.room == self.session.stream_id()
            && ack.kind == expected
            && status == SessionStatus::Starting;

        if !applies {
            debug!(status = ?status, "Ignoring stale or advisory acknowledgement");
            return false;
        }

        self.session.mark_recording();
        info!(session_id = ?self.session.session_id(), "Recording acknowledged");

        true
    }

    fn stop_legacy(&mut self) -> SessionSummary {
        self.emit(SignalKind::Stop);

        self.session.finalize_stop(Instant::now());
        self.session.set_status(SessionStatus::Idle);
        self.claim = None;

        let summary = SessionSummary {
            stream_id: self.session.stream_id().to_string(),
            duration: self.session.duration().unwrap_or_default(),
            edl_entries: self.session.edl().len(),
        };

        info!(
            duration_ms = summary.duration.as_millis(),
            edl_entries = summary.edl_entries,
            "Recording stopped"
        );

        summary
    }

    fn stop_iso(&mut self) -> Result<HandoverReceipt, StopError> {
        self.emit(SignalKind::StopIso);

        self.session.finalize_stop(Instant::now());
        self.session.set_status(SessionStatus::Stopping);

        info!(
            session_id = ?self.session.session_id(),
            duration_ms = self.session.duration().unwrap_or_default().as_millis(),
            edl_entries = self.session.edl().len(),
            "Iso recording stopped, handing over"
        );

        Ok(self.run_handover()?)
    }

    fn run_handover(&mut self) -> Result<HandoverReceipt, HandoverError> {
        match self.handover.handover(&mut self.session) {
            Ok(receipt) => {
                self.claim = None;
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = ?e, "Handover failed, session left stopping for retry");
                Err(e)
            }
        }
    }

    fn emit(&self, kind: SignalKind) {
        let event = SignalEvent::new(kind, self.session.stream_id());
        if let Err(e) = self.signaling.emit(&event) {
            warn!(error = ?e, "Signal not delivered, continuing with local state");
        }
    }

    #[track_caller]
    fn ensure_not_in_flight(&self) -> StartResult<()> {
        if self.session.is_in_flight() {
            return Err(StartRejection::SessionAlreadyActive {
                status: self.session.status(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}
