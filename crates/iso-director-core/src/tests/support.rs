//! Test doubles shared by the core test modules.

use crate::{
    Handover, HandoverStore, MemoryStore, ModeController, ModePolicy, Navigator, Orchestrator,
    OrchestratorConfig, RecordingMode, RecordingSlot, Session, SignalError, SignalEvent,
    SignalingChannel, StoreError,
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;

pub(crate) const DOWNLOADS: &str = "downloads.html";

/// Signaling channel that remembers every emit attempt.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingSignaling {
    events: Arc<Mutex<Vec<SignalEvent>>>,
    offline: bool,
}

impl RecordingSignaling {
    pub(crate) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(crate) fn events(&self) -> Vec<SignalEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SignalingChannel for RecordingSignaling {
    fn emit(&self, event: &SignalEvent) -> Result<(), SignalError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        if self.offline {
            return Err(SignalError::NoTransport {
                event: event.kind.wire_name(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

/// Memory store that fails a configurable number of batches first.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    failures_left: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub(crate) fn failing(times: usize) -> Self {
        let store = Self::default();
        store.failures_left.store(times, Ordering::SeqCst);
        store
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl HandoverStore for FlakyStore {
    fn write_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StoreError::Unavailable {
                reason: "quota exceeded".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.inner.write_batch(entries)
    }

    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(key)
    }
}

/// Navigator that remembers where it was sent.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingNavigator {
    visits: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub(crate) fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, url: &str) {
        self.visits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
    }
}

pub(crate) type TestConsole = Orchestrator<RecordingSignaling, FlakyStore, RecordingNavigator>;

/// An orchestrator plus handles onto its collaborators.
pub(crate) struct Harness {
    pub(crate) console: TestConsole,
    pub(crate) signaling: RecordingSignaling,
    pub(crate) store: FlakyStore,
    pub(crate) navigator: RecordingNavigator,
}

pub(crate) struct HarnessBuilder {
    mode: RecordingMode,
    room: String,
    source: bool,
    policy: ModePolicy,
    config: OrchestratorConfig,
    slot: RecordingSlot,
    signaling: RecordingSignaling,
    store: FlakyStore,
}

impl HarnessBuilder {
    pub(crate) fn new(mode: RecordingMode, room: &str) -> Self {
        Self {
            mode,
            room: room.to_string(),
            source: false,
            policy: ModePolicy::default(),
            config: OrchestratorConfig::default(),
            slot: RecordingSlot::new(),
            signaling: RecordingSignaling::default(),
            store: FlakyStore::default(),
        }
    }

    pub(crate) fn source(mut self, active: bool) -> Self {
        self.source = active;
        self
    }

    pub(crate) fn policy(mut self, policy: ModePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub(crate) fn await_start_ack(mut self) -> Self {
        self.config.await_start_ack = true;
        self
    }

    pub(crate) fn slot(mut self, slot: RecordingSlot) -> Self {
        self.slot = slot;
        self
    }

    pub(crate) fn signaling(mut self, signaling: RecordingSignaling) -> Self {
        self.signaling = signaling;
        self
    }

    pub(crate) fn store(mut self, store: FlakyStore) -> Self {
        self.store = store;
        self
    }

    pub(crate) fn build(self) -> Harness {
        let navigator = RecordingNavigator::default();
        let handover = Handover::new(self.store.clone(), navigator.clone(), DOWNLOADS);
        let mut console = Orchestrator::new(
            Session::new(self.mode, self.room),
            ModeController::new(self.policy, self.slot),
            self.signaling.clone(),
            handover,
            self.config,
        );
        console.set_active_source(self.source);

        Harness {
            console,
            signaling: self.signaling,
            store: self.store,
            navigator,
        }
    }
}
