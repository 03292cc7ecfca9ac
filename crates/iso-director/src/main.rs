//! Iso-Director: headless recording console for a multi-camera director.

mod app;
mod app_command;
mod browser_navigator;
mod config;
mod error;
mod operator_input;
mod signal_server;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    browser_navigator::BrowserNavigator,
    error::{AppError, Result as AppResult},
    operator_input::OperatorInput,
    signal_server::SignalServer,
};

use crate::config::Config;

use std::time::Duration;

use iso_director_core::BroadcastSignaling;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "iso_director=debug,iso_director_core=debug";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate_download_url() {
        error!("Download Manager URL validation failed: {:?}", e);
        std::process::exit(1);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let signaling = BroadcastSignaling::new();
        let (command_tx, command_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let server = SignalServer::new(config.signaling.port, signaling.clone(), command_tx.clone());
        let operator = OperatorInput::new(command_tx);
        let app = App {
            console: App::console_from_config(&config, signaling),
            command_rx,
            shutdown_tx,
        };

        let server_shutdown = shutdown_rx.clone();
        tokio::join!(
            async {
                if let Err(e) = server.run(server_shutdown).await {
                    error!(error = ?e, "Signaling endpoint error");
                }
            },
            async {
                if let Err(e) = operator.run(shutdown_rx).await {
                    error!(error = ?e, "Operator input error");
                }
            },
            async {
                if let Err(e) = app.run().await {
                    error!(error = ?e, "App error");
                }
            }
        );
    });

    // Standard input is read on a blocking thread that may still be parked
    // in read(); do not wait on it forever.
    rt.shutdown_timeout(Duration::from_secs(1));
    info!("Exited");
}
