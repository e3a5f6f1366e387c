use crate::domain::OptionsDocument;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

/// Holder of the single shared options document.
///
/// The store is a pure data holder: every mutation is expected to be followed
/// by a broadcast, but broadcasting is the caller's job. Internally the
/// document is a JSON object seeded from [`OptionsDocument::default`], so
/// updates for keys outside the known schema are stored verbatim. That
/// permissiveness is deliberate: it is the observed behavior of the protocol,
/// kept as-is rather than hardened behind an allowlist.
pub struct OptionsStore {
    document: RwLock<Map<String, Value>>,
}

impl OptionsStore {
    /// Creates the store seeded with the full default document.
    pub fn new() -> Self {
        Self {
            document: RwLock::new(OptionsDocument::default().to_object()),
        }
    }

    /// Atomically swaps the whole document.
    pub async fn replace_all(&self, document: &OptionsDocument) {
        *self.document.write().await = document.to_object();
    }

    /// Sets a single field, leaving every other field untouched. Unknown keys
    /// are stored as-is; last write wins.
    pub async fn apply_key_update(&self, key: &str, value: Value) {
        self.document.write().await.insert(key.to_string(), value);
    }

    /// Owned copy of the current document, safe to serialize and send without
    /// racing the store's own mutation.
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.document.read().await.clone()
    }
}

impl Default for OptionsStore {
    fn default() -> Self {
        Self::new()
    }
}
