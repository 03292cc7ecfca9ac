use crate::{
    ModeController, ModePolicy, RecordingMode, RecordingSlot, Session, StartRejection,
};

/// WHAT: Legacy accepts a session with a live source
/// WHY: A selected camera is the only Legacy precondition
#[test]
fn given_legacy_with_source_when_checking_then_ok() {
    // Given: Legacy session with a source and no room
    let mut session = Session::new(RecordingMode::Legacy, "");
    session.set_active_source(true);

    // When: Checking
    let result = ModeController::default().can_start(&session);

    // Then: Accepted, a room is not required in Legacy
    assert!(result.is_ok());
}

/// WHAT: Iso does not need a source by default
/// WHY: Iso records every camera regardless of program selection
#[test]
fn given_iso_without_source_when_checking_then_ok() {
    let session = Session::new(RecordingMode::Iso, "room7");

    let result = ModeController::default().can_start(&session);

    assert!(result.is_ok());
}

/// WHAT: Validation is repeatable and leaves the session untouched
/// WHY: The UI polls it to enable the record button
#[test]
fn given_rejected_session_when_checking_repeatedly_then_same_result() {
    // Given: Legacy session without a source
    let session = Session::new(RecordingMode::Legacy, "room7");
    let controller = ModeController::new(ModePolicy::default(), RecordingSlot::new());

    // When: Checking twice
    let first = controller.can_start(&session);
    let second = controller.can_start(&session);

    // Then: Same rejection, no state change, slot untouched
    assert!(matches!(first, Err(StartRejection::NoSourceSelected { .. })));
    assert!(matches!(second, Err(StartRejection::NoSourceSelected { .. })));
    assert!(session.started_at().is_none());
    assert!(!controller.slot().is_held());
}

/// WHAT: A held slot rejects Iso starts
/// WHY: Only one session records in the console
#[test]
#[allow(clippy::unwrap_used)]
fn given_held_slot_when_checking_iso_then_already_active() {
    // Given: A slot claimed elsewhere
    let slot = RecordingSlot::new();
    let claim = slot.try_claim().unwrap();
    let controller = ModeController::new(ModePolicy::default(), slot.clone());
    let session = Session::new(RecordingMode::Iso, "room7");

    // When: Checking while held, then after release
    let held = controller.can_start(&session);
    drop(claim);
    let released = controller.can_start(&session);

    // Then: Rejected, then accepted
    assert!(matches!(
        held,
        Err(StartRejection::SessionAlreadyActive { .. })
    ));
    assert!(released.is_ok());
}

/// WHAT: A slot can only be claimed once at a time
/// WHY: The claim is the console-wide single-session lock
#[test]
fn given_claimed_slot_when_claiming_again_then_none() {
    let slot = RecordingSlot::new();

    let first = slot.try_claim();
    let second = slot.clone().try_claim();

    assert!(first.is_some());
    assert!(second.is_none());
    assert!(slot.is_held());
}

/// WHAT: A held slot rejects Legacy starts as well
/// WHY: The UI check must agree with what start will do
#[test]
#[allow(clippy::unwrap_used)]
fn given_held_slot_when_checking_legacy_with_source_then_already_active() {
    // Given: A slot claimed by another session, Legacy session with a source
    let slot = RecordingSlot::new();
    let claim = slot.try_claim().unwrap();
    let controller = ModeController::new(ModePolicy::default(), slot.clone());
    let mut session = Session::new(RecordingMode::Legacy, "room7");
    session.set_active_source(true);

    // When: Checking while held, then after release
    let held = controller.can_start(&session);
    drop(claim);
    let released = controller.can_start(&session);

    // Then: Rejected, then accepted
    assert!(matches!(
        held,
        Err(StartRejection::SessionAlreadyActive { .. })
    ));
    assert!(released.is_ok());
}
