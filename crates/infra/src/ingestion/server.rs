//! WebSocket ingestion server
//!
//! Accepts connections from the browser extension on `/` and `/ws`. Each
//! connection gets its own client id and handler task; text frames go to the
//! [`IngestionService`], everything else is dropped. On shutdown the listener
//! stops accepting, every handler closes its socket and purges its client's
//! web sessions, and the server task is joined within the shutdown timeout.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use deskpulse_core::{FrameOutcome, IngestionService};
use deskpulse_domain::{DeskPulseError, IngestionConfig, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::observability::log_metric;
use crate::observability::metrics::IngestionMetrics;

#[derive(Clone)]
struct ServerState {
    service: Arc<IngestionService>,
    metrics: Arc<IngestionMetrics>,
    cancellation: CancellationToken,
}

/// Running ingestion server
pub struct IngestionServer {
    local_addr: SocketAddr,
    cancellation: CancellationToken,
    connections: TaskTracker,
    handle: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl IngestionServer {
    /// Bind `bind_address:port` and start serving.
    ///
    /// Port `0` binds an ephemeral port; see [`Self::local_addr`].
    ///
    /// # Errors
    /// Returns `DeskPulseError::Network` if the listener cannot be bound.
    pub async fn start(
        config: &IngestionConfig,
        service: Arc<IngestionService>,
        metrics: Arc<IngestionMetrics>,
    ) -> Result<Self> {
        let listener = TcpListener::bind((config.bind_address.as_str(), config.port)).await.map_err(|err| {
            DeskPulseError::Network(format!(
                "failed to bind ingestion server on {}:{}: {err}",
                config.bind_address, config.port
            ))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| DeskPulseError::Network(format!("failed to determine address: {err}")))?;

        let cancellation = CancellationToken::new();
        let connections = TaskTracker::new();
        let state = ServerState { service, metrics, cancellation: cancellation.clone() };

        let tracker = connections.clone();
        let app = Router::new()
            .route("/", get(upgrade))
            .route("/ws", get(upgrade))
            .with_state((state, tracker));

        let shutdown = cancellation.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
            {
                error!("Ingestion server error: {}", err);
            }
        });

        info!(address = %local_addr, "ingestion server listening");
        Ok(Self {
            local_addr,
            cancellation,
            connections,
            handle: Some(handle),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// WebSocket URL clients connect to.
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.local_addr)
    }

    /// Number of connection handlers still running.
    pub fn open_connections(&self) -> usize {
        self.connections.len()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Stop accepting, close every connection and wait for the handlers.
    /// Idempotent.
    ///
    /// # Errors
    /// Returns `DeskPulseError::Internal` if handlers or the server task did
    /// not finish within the shutdown timeout.
    pub async fn shutdown(&mut self) -> Result<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        self.cancellation.cancel();
        self.connections.close();

        let timeout = self.shutdown_timeout;
        let drained = tokio::time::timeout(timeout, async {
            self.connections.wait().await;
            (&mut handle).await
        })
        .await;

        match drained {
            Ok(Ok(())) => {
                info!("ingestion server stopped");
                Ok(())
            }
            Ok(Err(join_err)) => {
                Err(DeskPulseError::Internal(format!("ingestion server task failed: {join_err}")))
            }
            Err(_) => {
                handle.abort();
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    open_connections = self.connections.len(),
                    "ingestion server shutdown timed out"
                );
                Err(DeskPulseError::Internal(format!(
                    "ingestion server did not stop within {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }
}

impl Drop for IngestionServer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("IngestionServer dropped while running; cancelling");
            self.cancellation.cancel();
        }
    }
}

async fn upgrade(
    ws: WebSocketUpgrade,
    State((state, tracker)): State<(ServerState, TaskTracker)>,
) -> Response {
    ws.on_upgrade(move |socket| tracker.track_future(handle_socket(socket, state)))
}

async fn handle_socket(mut socket: WebSocket, state: ServerState) {
    let client_id = state.service.connect();
    log_metric(state.metrics.record_connection_opened(), "ingestion.connections_opened");
    info!(%client_id, "browser client connected");

    loop {
        tokio::select! {
            _ = state.cancellation.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            frame = socket.recv() => match frame {
                Some(Ok(Message::Text(text))) => {
                    log_metric(state.metrics.record_frame_received(), "ingestion.frames_received");
                    let outcome = state.service.handle_frame(client_id, text.as_str()).await;
                    if matches!(outcome, FrameOutcome::Malformed | FrameOutcome::Discarded) {
                        log_metric(state.metrics.record_frame_dropped(), "ingestion.frames_dropped");
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    debug!(%client_id, "dropping binary frame");
                    log_metric(state.metrics.record_frame_dropped(), "ingestion.frames_dropped");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    debug!(%client_id, error = %err, "connection error");
                    break;
                }
            }
        }
    }

    let closed_sessions = state.service.disconnect(client_id).await;
    log_metric(state.metrics.record_connection_closed(), "ingestion.connections_closed");
    info!(%client_id, closed_sessions, "browser client disconnected");
}
