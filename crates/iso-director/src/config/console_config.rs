use crate::config::default_timer_tick_ms;

use iso_director_core::RecordingMode;
use serde::{Deserialize, Serialize};

/// Director console behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Mode the console starts in.
    #[serde(default)]
    pub default_mode: RecordingMode,

    /// Room to address at startup, if any.
    #[serde(default)]
    pub default_room: Option<String>,

    /// Require a live camera before Iso recording can start.
    #[serde(default)]
    pub iso_requires_source: bool,

    /// Wait for the capture backend to acknowledge a start before recording.
    #[serde(default)]
    pub await_start_ack: bool,

    /// Elapsed-time display tick in milliseconds.
    #[serde(default = "default_timer_tick_ms")]
    pub timer_tick_ms: u64,
}
