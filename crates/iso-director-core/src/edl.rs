//! Edit Decision List: which camera was live, and when.

use crate::{Session, SessionStatus};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Smallest gap between two EDL entries.
///
/// Two selections can land on the same clock reading; the later one is
/// stamped this far after its predecessor so timestamps stay strictly
/// increasing without reordering or dropping anything.
pub(crate) const MIN_EDL_STEP: Duration = Duration::from_micros(1);

/// One camera-selection change while recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdlEntry {
    /// Offset from the session's `started_at`, serialized as seconds.
    #[serde(with = "duration_secs")]
    pub timestamp: Duration,
    /// Camera/stream that went live at `timestamp`.
    pub selected_stream_ref: String,
}

/// Ordered, append-only list of [`EdlEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Edl {
    entries: Vec<EdlEntry>,
}

impl Edl {
    pub fn entries(&self) -> &[EdlEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&EdlEntry> {
        self.entries.last()
    }

    /// JSON array of `{timestamp, selectedStreamRef}`, as the Download
    /// Manager reads it.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn push(&mut self, entry: EdlEntry) {
        self.entries.push(entry);
    }
}

/// Appends camera-switch events to a recording [`Session`].
pub struct EdlBuilder;

impl EdlBuilder {
    /// Record that `selected_stream_ref` went live now.
    ///
    /// Returns the entry's offset, or `None` when the session is not
    /// recording (logged, not an error).
    pub fn record(session: &mut Session, selected_stream_ref: &str) -> Option<Duration> {
        Self::record_at(session, selected_stream_ref, Instant::now())
    }

    pub(crate) fn record_at(
        session: &mut Session,
        selected_stream_ref: &str,
        now: Instant,
    ) -> Option<Duration> {
        if session.status() != SessionStatus::Recording {
            debug!(
                status = ?session.status(),
                selected = selected_stream_ref,
                "Ignoring source selection outside of recording"
            );
            return None;
        }

        let Some(started_at) = session.started_at() else {
            warn!(
                selected = selected_stream_ref,
                "Recording session has no start time, dropping selection"
            );
            return None;
        };

        let measured = now.saturating_duration_since(started_at);
        let timestamp = match session.edl().last() {
            Some(prev) if measured <= prev.timestamp => prev.timestamp + MIN_EDL_STEP,
            _ => measured,
        };

        session.edl_mut().push(EdlEntry {
            timestamp,
            selected_stream_ref: selected_stream_ref.to_string(),
        });

        debug!(
            selected = selected_stream_ref,
            timestamp_ms = timestamp.as_millis(),
            entries = session.edl().len(),
            "EDL entry recorded"
        );

        Some(timestamp)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
