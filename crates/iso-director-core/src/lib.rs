//! Iso-director Core Library
//!
//! Recording-session orchestration for a multi-camera director console:
//! Legacy and Iso recording modes, start/stop signaling towards a capture
//! backend, an Edit Decision List of camera switches, and the handover of
//! Iso sessions to the Download Manager.
//!
//! # Example
//!
//! ```no_run
//! use iso_director_core::{
//!     BroadcastSignaling, FileStore, Handover, ModeController, Navigator, Orchestrator,
//!     OrchestratorConfig, RecordingMode, Session, StopOutcome,
//! };
//!
//! struct Log;
//! impl Navigator for Log {
//!     fn navigate(&mut self, url: &str) {
//!         println!("navigate to {url}");
//!     }
//! }
//!
//! let signaling = BroadcastSignaling::new();
//! let _backend = signaling.subscribe();
//! let handover = Handover::new(FileStore::new("handover.json"), Log, "downloads.html");
//! let mut console = Orchestrator::new(
//!     Session::new(RecordingMode::Iso, "room7"),
//!     ModeController::default(),
//!     signaling,
//!     handover,
//!     OrchestratorConfig::default(),
//! );
//!
//! console.start()?;
//! console.select_source("camA");
//! console.select_source("camB");
//! if let StopOutcome::HandedOff(receipt) = console.stop()? {
//!     println!("handed off {}", receipt.session_id);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod edl;
mod error;
mod handover;
mod mode;
mod orchestrator;
mod session;
mod signaling;
mod timer;

pub use {
    edl::{Edl, EdlBuilder, EdlEntry},
    error::{HandoverError, SignalError, StartRejection, StartResult, StopError, StoreError},
    handover::{
        EDL_KEY, FileStore, Handover, HandoverReceipt, HandoverRecord, HandoverStore, MemoryStore,
        Navigator, SESSION_ID_KEY, STREAM_ID_KEY,
    },
    mode::{ModeController, ModePolicy, RecordingSlot},
    orchestrator::{
        DEFAULT_TIMER_TICK, Orchestrator, OrchestratorConfig, SessionSummary, StopOutcome,
    },
    session::{RecordingMode, Session, SessionStatus},
    signaling::{BroadcastSignaling, RoomPayload, SignalAck, SignalEvent, SignalKind, SignalingChannel},
    timer::RecordTimer,
};

#[cfg(test)]
mod tests;
