use crate::{AppError, AppResult};

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;
use iso_director_core::{RecordingMode, SignalAck};

/// Commands processed one at a time by the main application loop.
///
/// Operator actions arrive from the terminal, acknowledgements from the
/// signaling endpoint; both go through the same queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Switch between Legacy and Iso recording.
    SetMode(RecordingMode),
    /// Address a different room.
    SetRoom(String),
    /// Upstream camera-selection signal.
    SetSource(bool),
    /// Start recording.
    Start,
    /// Stop recording.
    Stop,
    /// A camera went live.
    Select(String),
    /// Retry a failed handover.
    RetryHandover,
    /// Log the current session state.
    Status,
    /// Advisory acknowledgement from a capture backend.
    Acknowledge(SignalAck),
    /// Request application shutdown.
    Shutdown,
}

impl FromStr for AppCommand {
    type Err = AppError;

    /// Parse one operator input line.
    #[track_caller]
    fn from_str(line: &str) -> AppResult<Self> {
        let invalid = |reason: &str| AppError::InvalidCommand {
            input: line.to_string(),
            reason: reason.to_string(),
            location: ErrorLocation::from(Location::caller()),
        };

        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("start", "") => AppCommand::Start,
            ("stop", "") => AppCommand::Stop,
            ("retry", "") => AppCommand::RetryHandover,
            ("status", "") => AppCommand::Status,
            ("quit" | "exit", "") => AppCommand::Shutdown,
            ("mode", "legacy") => AppCommand::SetMode(RecordingMode::Legacy),
            ("mode", "iso") => AppCommand::SetMode(RecordingMode::Iso),
            ("mode", _) => return Err(invalid("expected `mode legacy` or `mode iso`")),
            ("source", "on") => AppCommand::SetSource(true),
            ("source", "off") => AppCommand::SetSource(false),
            ("source", _) => return Err(invalid("expected `source on` or `source off`")),
            ("room", "") => return Err(invalid("expected `room <stream id>`")),
            ("room", room) => AppCommand::SetRoom(room.to_string()),
            ("select", "") => return Err(invalid("expected `select <stream ref>`")),
            ("select", stream_ref) => AppCommand::Select(stream_ref.to_string()),
            ("", _) => return Err(invalid("empty command")),
            _ => return Err(invalid("unknown command")),
        };

        Ok(command)
    }
}
