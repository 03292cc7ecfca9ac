//! Operator input from the terminal.
//!
//! Reads one command per line from standard input and forwards it to the
//! main application. End of input is treated as a shutdown request.

use crate::{AppCommand, AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{debug, info, instrument, warn};

/// Forwards operator commands to the application loop.
pub struct OperatorInput {
    command_tx: mpsc::Sender<AppCommand>,
}

impl OperatorInput {
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run until shutdown or end of input.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Operator input shutting down");
                    break;
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) if line.trim().is_empty() => {}
                        Some(line) => {
                            if !self.forward(&line).await? {
                                break;
                            }
                        }
                        None => {
                            info!("Operator input closed, requesting shutdown");
                            self.send(AppCommand::Shutdown).await?;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse and forward one line. Returns false once shutdown was sent.
    async fn forward(&self, line: &str) -> AppResult<bool> {
        let command = match line.parse::<AppCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Ignoring operator input");
                return Ok(true);
            }
        };

        debug!(command = ?command, "Operator command");
        let keep_reading = command != AppCommand::Shutdown;
        self.send(command).await?;

        Ok(keep_reading)
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to forward operator command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
