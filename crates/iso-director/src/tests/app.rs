use crate::{App, AppCommand, AppError, config::Config};

use iso_director_core::{
    BroadcastSignaling, HandoverError, RecordingMode, SessionStatus, SignalAck, SignalKind,
    StartRejection,
};
use tokio::sync::{mpsc, watch};

fn app_with(toml: &str) -> (App, mpsc::Sender<AppCommand>, BroadcastSignaling) {
    #[allow(clippy::unwrap_used)]
    let config = Config::parse(toml).unwrap();
    let signaling = BroadcastSignaling::new();
    let (command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, _) = watch::channel(false);
    let app = App {
        console: App::console_from_config(&config, signaling.clone()),
        command_rx,
        shutdown_tx,
    };
    (app, command_tx, signaling)
}

fn config_toml(dir: &std::path::Path, console: &str) -> String {
    format!(
        "[console]\n{console}\n[signaling]\n\n[handover]\nstore_path = {:?}\n",
        dir.join("handover.json")
    )
}

/// WHAT: A Legacy cycle through commands ends Idle with the EDL kept
/// WHY: Operator commands drive the orchestrator one at a time
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_legacy_console_when_running_commands_then_cycle_completes() {
    // Given: A Legacy console with a backend attached
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _tx, signaling) = app_with(&config_toml(dir.path(), "default_room = \"room7\""));
    let mut backend = signaling.subscribe();

    // When: source on, start, select, stop
    for cmd in [
        AppCommand::SetSource(true),
        AppCommand::Start,
        AppCommand::Select("camA".to_string()),
        AppCommand::Stop,
    ] {
        app.handle(cmd).unwrap();
    }

    // Then: Backend saw start and stop, console idle, nothing persisted
    assert_eq!(backend.recv().await.unwrap().kind, SignalKind::Start);
    assert_eq!(backend.recv().await.unwrap().kind, SignalKind::Stop);
    assert_eq!(app.console.status(), SessionStatus::Idle);
    assert_eq!(app.console.session().edl().len(), 1);
    assert!(!dir.path().join("handover.json").exists());
}

/// WHAT: Rejections surface as StartRejected without state change
/// WHY: The operator is told why the start did not happen
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_iso_console_without_room_when_starting_then_start_rejected() {
    // Given: An Iso console with no room
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _tx, _signaling) = app_with(&config_toml(dir.path(), "default_mode = \"iso\""));

    // When: Starting
    let result = app.handle(AppCommand::Start);

    // Then: MissingStreamId surfaced, still Idle
    assert!(matches!(
        result,
        Err(AppError::StartRejected {
            source: StartRejection::MissingStreamId { .. },
            ..
        })
    ));
    assert_eq!(app.console.status(), SessionStatus::Idle);
}

/// WHAT: Retry with nothing to hand over is reported
/// WHY: Retry only applies to a session left Stopping
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_console_when_retrying_then_handover_failed() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _tx, _signaling) = app_with(&config_toml(dir.path(), ""));

    let result = app.handle(AppCommand::RetryHandover);

    assert!(matches!(
        result,
        Err(AppError::HandoverFailed {
            source: HandoverError::InvalidState { .. },
            ..
        })
    ));
}

/// WHAT: A start acknowledgement moves a waiting console to Recording
/// WHY: Acks from the signaling endpoint share the command queue
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_console_awaiting_ack_when_ack_command_then_recording() {
    // Given: An Iso console that waits for acknowledgement, started
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _tx, _signaling) = app_with(&config_toml(
        dir.path(),
        "default_mode = \"iso\"\ndefault_room = \"room7\"\nawait_start_ack = true",
    ));
    app.handle(AppCommand::Start).unwrap();
    assert_eq!(app.console.status(), SessionStatus::Starting);

    // When: The backend acknowledges
    app.handle(AppCommand::Acknowledge(SignalAck {
        kind: SignalKind::StartIso,
        room: "room7".to_string(),
    }))
    .unwrap();

    // Then: Recording
    assert_eq!(app.console.status(), SessionStatus::Recording);
    assert_eq!(app.console.session().mode(), RecordingMode::Iso);
}

/// WHAT: The run loop exits on Shutdown and signals the other tasks
/// WHY: Server and operator input stop with the application loop
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_running_app_when_shutdown_sent_then_loop_exits_and_broadcasts() {
    // Given: An app with a shutdown watcher
    let dir = tempfile::tempdir().unwrap();
    let (mut app, tx, _signaling) = app_with(&config_toml(dir.path(), ""));
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    app.shutdown_tx = shutdown_tx;

    // When: Status then Shutdown are queued
    tx.send(AppCommand::Status).await.unwrap();
    tx.send(AppCommand::Shutdown).await.unwrap();
    app.run().await.unwrap();

    // Then: Shutdown was broadcast
    shutdown_rx.changed().await.unwrap();
    assert!(*shutdown_rx.borrow());
}
