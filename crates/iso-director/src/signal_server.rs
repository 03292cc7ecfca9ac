//! WebSocket endpoint for capture backends.
//!
//! A backend connects to `/signal?room=<stream id>` and receives every start
//! and stop event addressed to that room as a JSON text frame. Text frames it
//! sends back are parsed as acknowledgements and queued for the application
//! loop, which decides whether they still apply.

use crate::{AppCommand, AppError, AppResult};

use std::{net::SocketAddr, panic::Location};

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use error_location::ErrorLocation;
use iso_director_core::{BroadcastSignaling, SignalAck, SignalEvent};
use serde::Deserialize;
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc, watch},
};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
struct SignalState {
    signaling: BroadcastSignaling,
    command_tx: mpsc::Sender<AppCommand>,
}

#[derive(Debug, Deserialize)]
struct RoomQuery {
    room: String,
}

/// Serves the signaling endpoint until shutdown.
pub struct SignalServer {
    port: u16,
    state: SignalState,
}

impl SignalServer {
    pub fn new(
        port: u16,
        signaling: BroadcastSignaling,
        command_tx: mpsc::Sender<AppCommand>,
    ) -> Self {
        Self {
            port,
            state: SignalState {
                signaling,
                command_tx,
            },
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/signal", get(upgrade))
            .with_state(self.state.clone())
    }

    /// Bind and serve until `shutdown_rx` changes.
    #[instrument(skip(self, shutdown_rx), fields(port = self.port))]
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::ServerError {
                reason: format!("Failed to bind {}: {}", addr, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(addr = %addr, "Signaling endpoint listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
            .map_err(|e| AppError::ServerError {
                reason: format!("Signaling endpoint failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("Signaling endpoint stopped");

        Ok(())
    }
}

async fn upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<RoomQuery>,
    State(state): State<SignalState>,
) -> Response {
    ws.on_upgrade(move |socket| relay(socket, query.room, state))
}

#[instrument(skip(socket, state))]
async fn relay(mut socket: WebSocket, room: String, state: SignalState) {
    // Subscribe before anything else so no event emitted after the upgrade
    // is missed.
    let mut events = state.signaling.subscribe();
    info!("Capture backend connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Some(frame) = frame_for(&room, &event) else {
                        continue;
                    };
                    if let Err(e) = socket.send(Message::Text(frame.into())).await {
                        warn!(error = %e, "Capture backend unreachable");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Capture backend lagged behind signaling");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = socket.recv() => match message {
                Some(Ok(Message::Text(text))) => {
                    if !forward_ack(text.as_str(), &state.command_tx).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Capture backend connection error");
                    break;
                }
            },
        }
    }

    info!("Capture backend disconnected");
}

/// JSON text frame for `event`, or `None` when it is addressed to another
/// room.
pub(crate) fn frame_for(room: &str, event: &SignalEvent) -> Option<String> {
    if event.room() != room {
        return None;
    }
    match serde_json::to_string(event) {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!(error = %e, event = %event.kind, "Failed to encode signal event");
            None
        }
    }
}

/// Queue an acknowledgement frame for the application loop.
///
/// Malformed frames are logged and skipped. Returns `false` once the
/// application loop is gone and the connection should close.
pub(crate) async fn forward_ack(text: &str, command_tx: &mpsc::Sender<AppCommand>) -> bool {
    match serde_json::from_str::<SignalAck>(text) {
        Ok(ack) => {
            debug!(event = %ack.kind, room = %ack.room, "Acknowledgement received");
            command_tx.send(AppCommand::Acknowledge(ack)).await.is_ok()
        }
        Err(e) => {
            warn!(error = %e, "Ignoring malformed backend message");
            true
        }
    }
}
