use crate::{AppCommand, AppResult, BrowserNavigator, config::Config};

use iso_director_core::{
    BroadcastSignaling, FileStore, Handover, ModeController, Orchestrator, RecordingSlot, Session,
    StopOutcome,
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};

/// The orchestrator as wired in this host.
pub(crate) type Console = Orchestrator<BroadcastSignaling, FileStore, BrowserNavigator>;

/// Main application state.
///
/// Owns the console and applies commands strictly one at a time, so
/// operator actions and backend acknowledgements never interleave.
pub struct App {
    pub(crate) console: Console,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Wire a console from configuration.
    pub(crate) fn console_from_config(config: &Config, signaling: BroadcastSignaling) -> Console {
        let handover = Handover::new(
            FileStore::new(&config.handover.store_path),
            BrowserNavigator,
            config.handover.download_url.clone(),
        );

        Orchestrator::new(
            Session::new(config.console.default_mode, config.initial_room()),
            ModeController::new(config.mode_policy(), RecordingSlot::new()),
            signaling,
            handover,
            config.orchestrator_config(),
        )
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!(
            mode = ?self.console.session().mode(),
            room = %self.console.session().stream_id(),
            "Iso-Director starting"
        );

        while let Some(cmd) = self.command_rx.recv().await {
            if cmd == AppCommand::Shutdown {
                info!("Shutdown requested");
                break;
            }
            if let Err(e) = self.handle(cmd) {
                error!(error = %e, "Command failed");
            }
        }

        if self.console.session().is_in_flight() {
            warn!(
                status = ?self.console.status(),
                "Shutting down with a session in flight"
            );
        }

        let _ = self.shutdown_tx.send(true);
        info!("Iso-Director shut down successfully");

        Ok(())
    }

    /// Apply one command to the console.
    #[instrument(skip(self))]
    pub(crate) fn handle(&mut self, cmd: AppCommand) -> AppResult<()> {
        match cmd {
            AppCommand::SetMode(mode) => self.console.set_mode(mode)?,
            AppCommand::SetRoom(room) => self.console.set_stream_id(room)?,
            AppCommand::SetSource(active) => self.console.set_active_source(active),
            AppCommand::Start => {
                let session = self.console.start()?;
                info!(
                    session_id = ?session.session_id(),
                    status = ?session.status(),
                    "Start accepted"
                );
            }
            AppCommand::Stop => match self.console.stop()? {
                StopOutcome::Finished(summary) => info!(
                    duration_ms = summary.duration.as_millis(),
                    edl_entries = summary.edl_entries,
                    "Legacy recording finished"
                ),
                StopOutcome::HandedOff(receipt) => info!(
                    session_id = %receipt.session_id,
                    destination = %receipt.destination,
                    "Iso session handed off"
                ),
            },
            AppCommand::Select(stream_ref) => {
                if self.console.select_source(&stream_ref).is_none() {
                    warn!(selected = %stream_ref, "Selection not recorded, console is not recording");
                }
            }
            AppCommand::RetryHandover => {
                let receipt = self.console.retry_handover()?;
                info!(session_id = %receipt.session_id, "Iso session handed off on retry");
            }
            AppCommand::Acknowledge(ack) => {
                self.console.acknowledge(&ack);
            }
            AppCommand::Status => self.log_status(),
            AppCommand::Shutdown => {}
        }

        Ok(())
    }

    fn log_status(&self) {
        let session = self.console.session();
        info!(
            mode = ?session.mode(),
            room = %session.stream_id(),
            status = ?session.status(),
            session_id = ?session.session_id(),
            has_source = session.has_active_source(),
            elapsed_ms = self.console.elapsed().as_millis(),
            edl_entries = session.edl().len(),
            can_start = self.console.can_start().is_ok(),
            "Console status"
        );
    }
}
