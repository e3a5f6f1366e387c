// WebSocket session handling: role validation, registration, inbound message
// routing and exactly-once teardown.

use crate::domain::Role;
use crate::interface_adapters::http::client_identity;
use crate::interface_adapters::protocol::ClientMessage;
use crate::interface_adapters::state::AppState;
use crate::use_cases::ClientEntry;

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::sink::SinkExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let identity = client_identity(&headers, peer, state.config.trust_proxy);
    ws.protocols([Role::Display.as_protocol(), Role::Author.as_protocol()])
        .on_upgrade(move |socket| handle_socket(socket, state, identity))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, identity: String) {
    // The negotiated sub-protocol is the role declaration. Anything else is a
    // protocol violation: close immediately, never touch the registry.
    let role = socket
        .protocol()
        .and_then(|protocol| protocol.to_str().ok())
        .and_then(Role::from_protocol);
    let Some(role) = role else {
        info!(%identity, "rejecting connection with invalid protocol");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::PROTOCOL,
                reason: "invalid protocol".into(),
            })))
            .await;
        let _ = socket.close().await;
        return;
    };

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Utf8Bytes>();
    let entry = state
        .registry
        .add(role, identity.clone(), epoch_seconds(), outbound_tx)
        .await;

    let span = info_span!("conn", client_id = entry.id, role = role.as_protocol());
    let _enter = span.enter();
    info!(%identity, "client connected");

    // Announce the new roster to authors, then hand this connection its
    // snapshot. Both sit in the outbound queue before the first inbound frame
    // is read, so a late joiner always starts from the current document.
    state.broadcaster.notify_roster_changed().await;
    state.broadcaster.notify_option_snapshot(&entry).await;

    run_client_loop(&mut socket, &entry, &state, outbound_rx).await;

    // Exactly-once teardown: remove is a no-op when a duplicate close event
    // already cleaned up, and only a successful remove re-announces the roster.
    if state.registry.remove(entry.id).await {
        state.broadcaster.notify_roster_changed().await;
    }
    info!(%identity, "client disconnected");
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn run_client_loop(
    socket: &mut WebSocket,
    entry: &ClientEntry,
    state: &Arc<AppState>,
    mut outbound_rx: mpsc::UnboundedReceiver<Utf8Bytes>,
) {
    loop {
        let disconnect = tokio::select! {
            // Incoming message from this client.
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, entry, state).await {
                    LoopControl::Continue => false,
                    LoopControl::Disconnect => true,
                }
            }

            // Outgoing notification queued by the broadcast engine.
            queued = outbound_rx.recv() => {
                match queued {
                    Some(bytes) => match socket.send(Message::Text(bytes)).await {
                        Ok(()) => false,
                        Err(e) => {
                            warn!(error = %e, "failed to send queued message");
                            true
                        }
                    },
                    // The registry entry is gone; nothing more will be queued.
                    None => true,
                }
            }
        };

        if disconnect {
            let _ = socket.close().await;
            break;
        }
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, axum::Error>>,
    entry: &ClientEntry,
    state: &Arc<AppState>,
) -> LoopControl {
    match incoming {
        Some(Ok(Message::Text(text))) => {
            handle_client_text(&text, entry, state).await;
            LoopControl::Continue
        }
        // Binary frames are not part of the protocol; drop without state change.
        Some(Ok(Message::Binary(_))) => {
            debug!("ignoring binary frame");
            LoopControl::Continue
        }
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => LoopControl::Continue,
        Some(Ok(Message::Close(frame))) => {
            match frame {
                Some(frame) => {
                    info!(code = frame.code, reason = %frame.reason, "client closed connection")
                }
                None => info!("client closed connection"),
            }
            LoopControl::Disconnect
        }
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => LoopControl::Disconnect,
    }
}

async fn handle_client_text(text: &str, entry: &ClientEntry, state: &Arc<AppState>) {
    // Two-stage parse: non-JSON is logged and dropped, while well-formed JSON
    // with an unrecognized tag stays a silent no-op for forward compatibility.
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, bytes = text.len(), "received invalid json; dropping");
            return;
        }
    };

    match serde_json::from_value::<ClientMessage>(value) {
        Ok(ClientMessage::UpdateOption { key, value }) => {
            debug!(%key, "option update");
            state.options.apply_key_update(&key, value.clone()).await;
            state
                .broadcaster
                .notify_option_changed(&key, value, entry.id)
                .await;
        }
        Ok(ClientMessage::UpdatePercent { value }) => {
            state.options.apply_key_update("percent", value.clone()).await;
            state.broadcaster.notify_percent_changed(value).await;
        }
        Err(_) => {
            debug!("ignoring unrecognized message");
        }
    }
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
