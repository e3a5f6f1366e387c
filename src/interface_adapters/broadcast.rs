use crate::domain::Role;
use crate::interface_adapters::protocol::{ClientInfoDto, ServerMessage};
use crate::use_cases::{ClientEntry, ClientRegistry, OptionsStore};

use axum::extract::ws::Utf8Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Fans out state-change notifications to connected clients.
///
/// Each notification is serialized once and the shared bytes are pushed into
/// every recipient's outbound queue. Delivery is best-effort, at-most-once and
/// per-recipient independent: a closed queue is logged and skipped, and the
/// rest of the fan-out proceeds. A recipient whose queue is closed is already
/// tearing down; its own close path removes it from the registry.
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    options: Arc<OptionsStore>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ClientRegistry>, options: Arc<OptionsStore>) -> Self {
        Self { registry, options }
    }

    /// Sends the sanitized roster to every author. Called after every add and
    /// every successful remove.
    pub async fn notify_roster_changed(&self) {
        let clients: Vec<ClientInfoDto> = self
            .registry
            .list_sanitized()
            .await
            .into_iter()
            .map(ClientInfoDto::from)
            .collect();
        let Some(bytes) = serialize(&ServerMessage::ReplaceClients { clients }) else {
            return;
        };
        for author in self.registry.list_by_role(Role::Author).await {
            deliver(&author, bytes.clone());
        }
    }

    /// Sends the full current document to exactly one connection.
    pub async fn notify_option_snapshot(&self, target: &ClientEntry) {
        let options = self.options.snapshot().await;
        let Some(bytes) = serialize(&ServerMessage::ReplaceOptions { options }) else {
            return;
        };
        deliver(target, bytes);
    }

    /// Relays a field edit to everyone except the originator.
    pub async fn notify_option_changed(&self, key: &str, value: Value, exclude_id: u64) {
        let message = ServerMessage::UpdateOption {
            key: key.to_string(),
            value,
        };
        let Some(bytes) = serialize(&message) else {
            return;
        };
        for client in self.registry.list_all().await {
            if client.id != exclude_id {
                deliver(&client, bytes.clone());
            }
        }
    }

    /// Relays a scroll-progress report to authors only. Displays, the sender
    /// included, do not hear their own progress echoed back.
    pub async fn notify_percent_changed(&self, value: Value) {
        let message = ServerMessage::UpdateOption {
            key: "percent".to_string(),
            value,
        };
        let Some(bytes) = serialize(&message) else {
            return;
        };
        for author in self.registry.list_by_role(Role::Author).await {
            deliver(&author, bytes.clone());
        }
    }
}

fn serialize(message: &ServerMessage) -> Option<Utf8Bytes> {
    match serde_json::to_string(message) {
        Ok(txt) => Some(Utf8Bytes::from(txt)),
        Err(e) => {
            error!(error = ?e, "failed to serialize server message");
            None
        }
    }
}

fn deliver(client: &ClientEntry, bytes: Utf8Bytes) {
    if client.outbound.send(bytes).is_err() {
        warn!(client_id = client.id, "client send queue closed; dropping message");
    }
}
