//! Axum handlers for the web server
//!
//! `/ws` is the observer channel: every published inventory snapshot is
//! pushed as an `inventory-update` message, and incoming text frames carry
//! fire-and-forget control requests. There is no acknowledgment path; a
//! control failure is observable only as the absence of a state change in
//! the next push.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::monitor::inventory::Inventory;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Server-to-observer push envelope.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PushMessage<'a> {
    InventoryUpdate(&'a Inventory),
}

/// Observer-to-server request kinds.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ControlRequest {
    StartService { name: String },
    StopService { name: String },
    RestartService { name: String },
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Latest inventory snapshot, or 503 before the first successful poll (in
/// which case an out-of-band poll is requested so a retry will find one).
pub async fn inventory(State(state): State<AppState>) -> Response {
    match state.broadcaster.latest().await {
        Some(inventory) => Json(inventory.as_ref().clone()).into_response(),
        None => {
            state.broadcaster.request_refresh();
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "code": "no_snapshot",
                    "message": "no inventory collected yet",
                })),
            )
                .into_response()
        }
    }
}

pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscription = state.broadcaster.subscribe().await;
    info!("observer connected");

    loop {
        tokio::select! {
            maybe_inventory = subscription.recv() => {
                let Some(inventory) = maybe_inventory else { break };
                let message = PushMessage::InventoryUpdate(inventory.as_ref());
                let payload = match serde_json::to_string(&message) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(error = %err, "failed to serialize inventory push");
                        continue;
                    }
                };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            maybe_message = receiver.next() => {
                match maybe_message {
                    Some(Ok(Message::Text(text))) => dispatch_control_request(&state, &text),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.broadcaster.unsubscribe(subscription).await;
    info!("observer disconnected");
}

/// Each control request runs as its own task so a slow command never blocks
/// the push loop. Success triggers an out-of-band refresh; failure is logged
/// and otherwise silent.
fn dispatch_control_request(state: &AppState, text: &str) {
    let request: ControlRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, "ignoring malformed control request");
            return;
        }
    };

    let controller = state.controller.clone();
    let broadcaster = state.broadcaster.clone();
    tokio::spawn(async move {
        let (operation, name, result) = match &request {
            ControlRequest::StartService { name } => {
                ("start", name.clone(), controller.start(name).await)
            }
            ControlRequest::StopService { name } => {
                ("stop", name.clone(), controller.stop(name).await)
            }
            ControlRequest::RestartService { name } => {
                ("restart", name.clone(), controller.restart(name).await)
            }
        };

        match result {
            Ok(()) => {
                info!(operation, service = %name, "control operation succeeded");
                broadcaster.request_refresh();
            }
            Err(err) => {
                warn!(operation, service = %name, error = %err, "control operation failed");
            }
        }
    });
}
