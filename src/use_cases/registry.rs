use crate::domain::Role;
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{RwLock, mpsc};

/// One live connection tracked by the registry.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    /// Process-unique id, strictly increasing, never reused.
    pub id: u64,
    /// Fixed for the connection's lifetime.
    pub role: Role,
    /// Best-effort originating address.
    pub identity: String,
    /// Unix-epoch seconds at connect time.
    pub joined_at: u64,
    /// Send queue draining into this connection's socket.
    pub outbound: mpsc::UnboundedSender<Utf8Bytes>,
}

/// Projection of a [`ClientEntry`] that is safe to hand to network-facing
/// serialization: everything except the transport handle.
#[derive(Debug, Clone)]
pub struct SanitizedClient {
    pub id: u64,
    pub identity: String,
    pub joined_at: u64,
    pub role: Role,
    /// Reserved; never populated today.
    pub status: Option<String>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    clients: Vec<ClientEntry>,
}

/// Registry of live connections. One lock guards the id counter and the entry
/// list, so every read sees a momentarily-consistent roster.
#[derive(Debug)]
pub struct ClientRegistry {
    inner: RwLock<RegistryInner>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Registers a connection, assigning the next id, and returns the stored
    /// entry.
    pub async fn add(
        &self,
        role: Role,
        identity: String,
        joined_at: u64,
        outbound: mpsc::UnboundedSender<Utf8Bytes>,
    ) -> ClientEntry {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        // Double registration would corrupt the roster; ids are assigned here,
        // so it can only happen through a registry bug.
        debug_assert!(
            inner.clients.iter().all(|client| client.id != id),
            "duplicate client id {id}"
        );
        let entry = ClientEntry {
            id,
            role,
            identity,
            joined_at,
            outbound,
        };
        inner.clients.push(entry.clone());
        entry
    }

    /// Removes the entry with the given id. Returns false when the entry was
    /// already gone, tolerating duplicate close notifications.
    pub async fn remove(&self, id: u64) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.clients.len();
        inner.clients.retain(|client| client.id != id);
        before != inner.clients.len()
    }

    /// Entries of one role, in join order.
    pub async fn list_by_role(&self, role: Role) -> Vec<ClientEntry> {
        self.inner
            .read()
            .await
            .clients
            .iter()
            .filter(|client| client.role == role)
            .cloned()
            .collect()
    }

    /// Every entry, in join order.
    pub async fn list_all(&self) -> Vec<ClientEntry> {
        self.inner.read().await.clients.clone()
    }

    /// Sanitized projections of every entry, in join order.
    pub async fn list_sanitized(&self) -> Vec<SanitizedClient> {
        self.inner
            .read()
            .await
            .clients
            .iter()
            .map(|client| SanitizedClient {
                id: client.id,
                identity: client.identity.clone(),
                joined_at: client.joined_at,
                role: client.role,
                status: None,
            })
            .collect()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
