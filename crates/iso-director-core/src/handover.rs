//! Handover Protocol: move an Iso session to the Download Manager.
//!
//! The session id, stream id and EDL are written to a persisted store under
//! three separate keys, then the console navigates to the Download Manager,
//! which reads them on load. The write is all-or-nothing; navigation only
//! happens once it has landed.

use crate::{Edl, HandoverError, RecordingMode, Session, SessionStatus, StoreError};

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Key holding the Iso session id.
pub const SESSION_ID_KEY: &str = "isoSessionId";
/// Key holding the room/stream id.
pub const STREAM_ID_KEY: &str = "isoStreamId";
/// Key holding the JSON-serialized EDL.
pub const EDL_KEY: &str = "isoEdl";

/// Durable string key/value store shared with the next page context.
pub trait HandoverStore {
    /// Write every entry, or none of them.
    fn write_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError>;

    /// Read a single key.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Forward navigation to another page.
///
/// Infallible from the orchestrator's point of view: once triggered, the
/// page belongs to the browser.
pub trait Navigator {
    /// Navigate to `url`.
    fn navigate(&mut self, url: &str);
}

/// JSON object file holding string keys.
///
/// Each batch rewrites the whole file through a temp file and a rename, so
/// readers never see a partial batch. Keys written by others are preserved.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[track_caller]
    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    #[track_caller]
    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(map)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(dir = ?parent, "Created handover store directory");
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.path.with_extension("json.tmp");
        let result = (|| {
            let mut temp_file = fs::File::create(&temp_path)?;
            temp_file.write_all(contents.as_bytes())?;
            temp_file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io {
                source: e,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }
}

impl HandoverStore for FileStore {
    #[instrument(skip(self, entries), fields(path = ?self.path, keys = entries.len()))]
    fn write_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.write_map(&map)?;

        debug!("Handover batch written");

        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_map()?.remove(key))
    }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map.
        self.map.lock().unwrap_or_else(|e| {
            warn!("Memory store lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl HandoverStore for MemoryStore {
    fn write_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut map = self.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }
}

/// The three values handed to the Download Manager.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoverRecord {
    /// Iso session id, kept opaque.
    pub session_id: String,
    /// Room the session recorded.
    pub stream_id: String,
    /// Camera selections made during the session.
    pub edl: Edl,
}

impl HandoverRecord {
    /// Snapshot a session. `None` if it has no session id (not Iso, or never
    /// started).
    pub fn from_session(session: &Session) -> Option<Self> {
        let session_id = session.session_id()?;
        Some(Self {
            session_id: session_id.to_string(),
            stream_id: session.stream_id().to_string(),
            edl: session.edl().clone(),
        })
    }

    /// Key/value pairs in the store's layout.
    pub fn to_entries(&self) -> Result<[(&'static str, String); 3], StoreError> {
        Ok([
            (SESSION_ID_KEY, self.session_id.clone()),
            (STREAM_ID_KEY, self.stream_id.clone()),
            (EDL_KEY, self.edl.to_json()?),
        ])
    }

    /// Load what a previous handover persisted, the way the Download Manager
    /// does on page load. `None` unless all three keys are present.
    pub fn read_from<S: HandoverStore + ?Sized>(store: &S) -> Result<Option<Self>, StoreError> {
        let (Some(session_id), Some(stream_id), Some(edl)) = (
            store.read(SESSION_ID_KEY)?,
            store.read(STREAM_ID_KEY)?,
            store.read(EDL_KEY)?,
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            session_id,
            stream_id,
            edl: Edl::from_json(&edl)?,
        }))
    }
}

/// Proof that a session was persisted and navigation was triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverReceipt {
    /// Iso session id that was handed over.
    pub session_id: Uuid,
    /// Room the session recorded.
    pub stream_id: String,
    /// Number of EDL entries persisted.
    pub edl_entries: usize,
    /// Where the console navigated.
    pub destination: String,
}

/// Persists a stopping Iso session and navigates to the Download Manager.
#[derive(Debug)]
pub struct Handover<S, N> {
    store: S,
    navigator: N,
    destination: String,
}

impl<S: HandoverStore, N: Navigator> Handover<S, N> {
    pub fn new(store: S, navigator: N, destination: impl Into<String>) -> Self {
        Self {
            store,
            navigator,
            destination: destination.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Persist `session` and navigate away.
    ///
    /// Only valid for an Iso session in `Stopping`. On a persistence failure
    /// nothing is navigated and the session stays `Stopping`, so the call can
    /// simply be repeated; the persisted values do not depend on how many
    /// attempts it took.
    #[track_caller]
    #[instrument(skip(self, session), fields(room = %session.stream_id()))]
    pub fn handover(&mut self, session: &mut Session) -> Result<HandoverReceipt, HandoverError> {
        let location = Location::caller();
        let invalid_state = |session: &Session| HandoverError::InvalidState {
            mode: session.mode(),
            status: session.status(),
            location: ErrorLocation::from(location),
        };

        if session.mode() != RecordingMode::Iso || session.status() != SessionStatus::Stopping {
            return Err(invalid_state(session));
        }

        let (Some(session_id), Some(record)) =
            (session.session_id(), HandoverRecord::from_session(session))
        else {
            return Err(invalid_state(session));
        };

        let entries = record
            .to_entries()
            .map_err(|source| HandoverError::PersistFailed {
                source,
                location: ErrorLocation::from(location),
            })?;

        // Step 1: persist, all three keys or none.
        if let Err(source) = self.store.write_batch(&entries) {
            error!(session_id = %session_id, error = ?source, "Handover persist failed");
            return Err(HandoverError::PersistFailed {
                source,
                location: ErrorLocation::from(location),
            });
        }

        // Step 2: only now leave for the Download Manager.
        info!(
            session_id = %session_id,
            destination = %self.destination,
            edl_entries = record.edl.len(),
            "Redirecting to Download Manager"
        );
        self.navigator.navigate(&self.destination);

        session.set_status(SessionStatus::HandedOff);

        Ok(HandoverReceipt {
            session_id,
            stream_id: record.stream_id,
            edl_entries: record.edl.len(),
            destination: self.destination.clone(),
        })
    }
}
