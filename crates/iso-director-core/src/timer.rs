use std::time::Duration;

use tokio::{runtime::Handle, sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, trace};

/// Elapsed-time counter for one recording.
///
/// Provides the EDL time base and, when an async runtime is available, a
/// ticker task that publishes the elapsed time for display. The ticker is
/// aborted on [`cancel`](Self::cancel) and on drop, so every exit path
/// releases it.
#[derive(Debug)]
pub struct RecordTimer {
    started_at: Instant,
    ticker: Option<JoinHandle<()>>,
}

impl RecordTimer {
    /// Start counting from `started_at`, publishing every `tick` on `elapsed_tx`.
    ///
    /// Publishing does not depend on anyone listening: a display that
    /// subscribes mid-recording picks up the next tick.
    pub fn start(started_at: Instant, tick: Duration, elapsed_tx: watch::Sender<Duration>) -> Self {
        elapsed_tx.send_replace(Duration::ZERO);

        let ticker = match Handle::try_current() {
            Ok(handle) => Some(handle.spawn(async move {
                let mut interval = tokio::time::interval_at(started_at + tick, tick);
                loop {
                    let at = interval.tick().await;
                    let elapsed = at.saturating_duration_since(started_at);
                    elapsed_tx.send_replace(elapsed);
                    trace!(elapsed_ms = elapsed.as_millis(), "Record timer tick");
                }
            })),
            Err(_) => {
                debug!("No async runtime, record timer runs without display ticks");
                None
            }
        };

        Self { started_at, ticker }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the ticker. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            debug!(
                elapsed_ms = self.elapsed().as_millis(),
                "Record timer canceled"
            );
        }
    }
}

impl Drop for RecordTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
