//! WebSocket subscription endpoint.
//!
//! Each viewer gets a bounded outbound queue drained by a writer task, and a
//! reader loop that treats inbound text frames as draft events. The viewer's
//! registry slot is released by a drop guard on every exit path.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::context::MonitorContext;
use crate::error::DeliveryError;
use crate::frame::parse_inbound;
use crate::registry::{Connection, ConnectionId};

/// Bound on the closing handshake sent to a viewer being torn down.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Bound on waiting for the writer task once the viewer is cancelled.
const WRITER_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Connection handle
// ---------------------------------------------------------------------------

/// Registry-side handle to one WebSocket viewer.
struct WsConnection {
    id: ConnectionId,
    tx: mpsc::Sender<Message>,
    cancel: CancellationToken,
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, text: &str) -> Result<(), DeliveryError> {
        self.tx
            .try_send(Message::Text(text.to_owned()))
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Backlogged,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    fn close(&self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Upgrade
// ---------------------------------------------------------------------------

pub async fn ws_handler(ws: WebSocketUpgrade, State(ctx): State<Arc<MonitorContext>>) -> Response {
    let Some(permit) = ctx.try_reserve_viewer() else {
        tracing::warn!("ws: connection limit reached, rejecting");
        return (StatusCode::SERVICE_UNAVAILABLE, "too many viewers").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, ctx, permit))
}

// ---------------------------------------------------------------------------
// Per-viewer handler
// ---------------------------------------------------------------------------

async fn handle_socket(socket: WebSocket, ctx: Arc<MonitorContext>, permit: OwnedSemaphorePermit) {
    let _permit = permit;
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (tx, mut rx) = mpsc::channel::<Message>(ctx.outbound_queue());
    let cancel = ctx.shutdown_token().child_token();
    let conn: Arc<dyn Connection> = Arc::new(WsConnection {
        id: ctx.registry().next_id(),
        tx,
        cancel: cancel.clone(),
    });

    let registration = match ctx.attach(Arc::clone(&conn)).await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(conn_id = conn.id(), error = %e, "ws: handshake snapshot failed");
            return;
        }
    };
    tracing::debug!(conn_id = registration.id(), "ws viewer connected");

    // --- writer: drain the outbound queue into the socket ---
    let writer_cancel = cancel.clone();
    let mut writer = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
                _ = writer_cancel.cancelled() => {
                    let _ = tokio::time::timeout(CLOSE_TIMEOUT, ws_tx.send(Message::Close(None))).await;
                    break;
                }
            };
            // A peer that stopped reading can park this send forever.
            tokio::select! {
                res = ws_tx.send(msg) => {
                    if let Err(e) = res {
                        tracing::debug!(error = %e, "ws write failed");
                        break;
                    }
                }
                _ = writer_cancel.cancelled() => break,
            }
        }
        // A dead writer ends the reader loop too.
        writer_cancel.cancel();
    });

    // --- reader: inbound frames until disconnect ---
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_inbound(&ctx, &conn, &text).await,
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(conn_id = conn.id(), "ws viewer disconnected");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(conn_id = conn.id(), error = %e, "ws read error, dropping viewer");
                        break;
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!(conn_id = conn.id(), "ws viewer cancelled");
                break;
            }
        }
    }

    cancel.cancel();
    if tokio::time::timeout(WRITER_GRACE, &mut writer).await.is_err() {
        tracing::debug!(conn_id = conn.id(), "ws writer stuck, aborting");
        writer.abort();
    }
    drop(registration);
}

async fn handle_inbound(ctx: &MonitorContext, conn: &Arc<dyn Connection>, text: &str) {
    let draft = match parse_inbound(text) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!(conn_id = conn.id(), error = %e, "ws: bad inbound frame");
            ctx.send_error(conn, &e.to_string());
            return;
        }
    };
    if let Err(e) = ctx.ingest(draft).await {
        tracing::debug!(conn_id = conn.id(), error = %e, "ws: ingest rejected");
        ctx.send_error(conn, &e.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
