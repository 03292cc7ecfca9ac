use crate::{
    Edl, EdlBuilder, EdlEntry, RecordingMode, Session, SessionStatus,
    edl::MIN_EDL_STEP,
};

use std::time::Duration;

use tokio::time::Instant;

fn recording_session(started_at: Instant) -> Session {
    let mut session = Session::new(RecordingMode::Iso, "room7");
    session.begin_starting(Some(uuid::Uuid::new_v4()), started_at);
    session.mark_recording();
    session
}

/// WHAT: Entries with the same clock reading stay strictly increasing
/// WHY: Consumers rely on strictly increasing offsets for gap detection
#[tokio::test(start_paused = true)]
async fn given_same_instant_when_recording_twice_then_second_is_nudged() {
    // Given: A recording session
    let start = Instant::now();
    let mut session = recording_session(start);
    let at = start + Duration::from_millis(500);

    // When: Two selections land on the same instant
    let first = EdlBuilder::record_at(&mut session, "camA", at);
    let second = EdlBuilder::record_at(&mut session, "camB", at);

    // Then: Both kept, in order, strictly increasing
    assert_eq!(first, Some(Duration::from_millis(500)));
    assert_eq!(second, Some(Duration::from_millis(500) + MIN_EDL_STEP));
    let refs: Vec<_> = session
        .edl()
        .entries()
        .iter()
        .map(|e| e.selected_stream_ref.as_str())
        .collect();
    assert_eq!(refs, vec!["camA", "camB"]);
}

/// WHAT: Repeated selections of the same camera are all kept
/// WHY: A no-op switch is meaningful downstream
#[tokio::test(start_paused = true)]
async fn given_identical_refs_when_recording_then_not_deduplicated() {
    // Given: A recording session
    let start = Instant::now();
    let mut session = recording_session(start);

    // When: camA selected three times
    for secs in 1..=3 {
        EdlBuilder::record_at(&mut session, "camA", start + Duration::from_secs(secs));
    }

    // Then: Three entries
    assert_eq!(session.edl().len(), 3);
    assert!(
        session
            .edl()
            .entries()
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp)
    );
}

/// WHAT: Recording outside of Recording is a no-op
/// WHY: The EDL is append-only during Recording only
#[tokio::test(start_paused = true)]
async fn given_starting_session_when_recording_then_ignored() {
    // Given: A session still Starting
    let start = Instant::now();
    let mut session = Session::new(RecordingMode::Iso, "room7");
    session.begin_starting(None, start);

    // When: Recording a selection
    let result = EdlBuilder::record_at(&mut session, "camA", start + Duration::from_secs(1));

    // Then: Nothing appended
    assert_eq!(session.status(), SessionStatus::Starting);
    assert!(result.is_none());
    assert!(session.edl().is_empty());
}

/// WHAT: stopped_at is never before the last EDL entry
/// WHY: No entry may carry a timestamp after the recorded stop
#[tokio::test(start_paused = true)]
async fn given_nudged_entry_when_finalizing_stop_then_stop_covers_entry() {
    // Given: Two entries sharing an instant, the second nudged past it
    let start = Instant::now();
    let at = start + Duration::from_secs(2);
    let mut session = recording_session(start);
    EdlBuilder::record_at(&mut session, "camA", at);
    EdlBuilder::record_at(&mut session, "camB", at);

    // When: Stopping at that same instant
    session.finalize_stop(at);

    // Then: The duration covers the last entry
    let last = session.edl().last().map(|e| e.timestamp);
    assert_eq!(session.duration(), last);
}

/// WHAT: EDL JSON parses back in the Download Manager's shape
/// WHY: Field names and seconds encoding are the cross-page contract
#[test]
#[allow(clippy::unwrap_used)]
fn given_download_manager_json_when_parsing_then_entries_match() {
    // Given: JSON as stored under isoEdl
    let json = r#"[{"timestamp":1.5,"selectedStreamRef":"cam2"}]"#;

    // When: Parsing
    let edl = Edl::from_json(json).unwrap();

    // Then: One entry at 1.5s
    assert_eq!(
        edl.entries(),
        &[EdlEntry {
            timestamp: Duration::from_millis(1500),
            selected_stream_ref: "cam2".to_string(),
        }]
    );
}

/// WHAT: Negative timestamps are rejected on parse
/// WHY: Offsets are measured from the start and cannot precede it
#[test]
fn given_negative_timestamp_when_parsing_then_error() {
    let result = Edl::from_json(r#"[{"timestamp":-1.0,"selectedStreamRef":"cam2"}]"#);

    assert!(result.is_err());
}
