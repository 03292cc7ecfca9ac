//! Mode Controller: decides whether a session may start recording.
//!
//! Pure validation. Safe to call repeatedly from the UI layer to enable or
//! disable the record button; nothing here mutates a [`Session`].

use crate::{RecordingMode, Session, SessionStatus, StartRejection, StartResult};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Product policy knobs for start validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModePolicy {
    /// Require a live camera before Iso recording can start, as Legacy does.
    pub iso_requires_source: bool,
}

/// Console-wide claim that one session is recording.
///
/// Clones share the same slot, so several orchestrators in one console
/// cannot record at the same time.
#[derive(Debug, Clone, Default)]
pub struct RecordingSlot {
    held: Arc<AtomicBool>,
}

impl RecordingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Claim the slot, or `None` when another session holds it.
    pub(crate) fn try_claim(&self) -> Option<SlotClaim> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotClaim {
                held: Arc::clone(&self.held),
            })
    }
}

/// Held while a session is in flight. Releases the slot on drop.
#[derive(Debug)]
pub(crate) struct SlotClaim {
    held: Arc<AtomicBool>,
}

impl Drop for SlotClaim {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}

/// Start preconditions for Legacy and Iso sessions.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    policy: ModePolicy,
    slot: RecordingSlot,
}

impl ModeController {
    pub fn new(policy: ModePolicy, slot: RecordingSlot) -> Self {
        Self { policy, slot }
    }

    pub fn policy(&self) -> ModePolicy {
        self.policy
    }

    pub fn slot(&self) -> &RecordingSlot {
        &self.slot
    }

    /// Check whether `session` may start recording.
    #[track_caller]
    #[instrument(skip(self, session), fields(mode = ?session.mode(), status = ?session.status()))]
    pub fn can_start(&self, session: &Session) -> StartResult<()> {
        if session.is_in_flight() {
            return Err(StartRejection::SessionAlreadyActive {
                status: session.status(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match session.mode() {
            RecordingMode::Legacy => self.check_legacy(session),
            RecordingMode::Iso => self.check_iso(session),
        }?;

        debug!("Start preconditions satisfied");

        Ok(())
    }

    #[track_caller]
    fn check_legacy(&self, session: &Session) -> StartResult<()> {
        self.require_free_slot()?;
        require_source(session)
    }

    #[track_caller]
    fn check_iso(&self, session: &Session) -> StartResult<()> {
        if session.stream_id().trim().is_empty() {
            return Err(StartRejection::MissingStreamId {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.require_free_slot()?;

        if self.policy.iso_requires_source {
            require_source(session)?;
        }

        Ok(())
    }

    /// The slot is console-wide, so a start in either mode waits for it.
    #[track_caller]
    fn require_free_slot(&self) -> StartResult<()> {
        if self.slot.is_held() {
            return Err(StartRejection::SessionAlreadyActive {
                status: SessionStatus::Recording,
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

#[track_caller]
fn require_source(session: &Session) -> StartResult<()> {
    if !session.has_active_source() {
        return Err(StartRejection::NoSourceSelected {
            location: ErrorLocation::from(Location::caller()),
        });
    }
    Ok(())
}
