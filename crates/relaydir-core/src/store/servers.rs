// ── Server stores ──

use std::sync::Arc;

use tokio::sync::watch;

use super::keyed::{KeySpec, KeyedStore, StoreWatch};
use crate::model::{Server, ServerStatus};

/// Store of directory entries, keyed by `uuid` and indexed by protocol.
pub struct ServersStore {
    entries: KeyedStore<Server>,
    total_count: watch::Sender<u64>,
}

impl ServersStore {
    pub fn new() -> Self {
        let entries = KeyedStore::new(
            vec![KeySpec {
                name: "uuid",
                extract: |s: &Server| s.uuid.clone(),
            }],
            vec![KeySpec {
                name: "protocol",
                extract: |s: &Server| s.protocol.to_string(),
            }],
        )
        .expect("uuid primary key declared");
        let (total_count, _) = watch::channel(0);
        Self {
            entries,
            total_count,
        }
    }

    pub fn upsert<I: IntoIterator<Item = Server>>(&self, servers: I) {
        self.entries.upsert(servers);
    }

    pub fn get(&self, uuid: &str) -> Option<Arc<Server>> {
        self.entries.get("uuid", uuid)
    }

    pub fn by_protocol(&self, protocol: &str) -> Vec<Arc<Server>> {
        self.entries.get_by_index("protocol", protocol)
    }

    pub fn all(&self) -> Vec<Arc<Server>> {
        self.entries.all()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn delete(&self, uuids: &[&str]) {
        self.entries.delete("uuid", uuids);
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.total_count.send_replace(0);
    }

    pub fn subscribe(&self) -> StoreWatch<Server> {
        self.entries.subscribe()
    }

    /// Total rows matching the last fetch's filters, as reported by the
    /// backend. Zero until the first counted fetch completes.
    pub fn total_count(&self) -> u64 {
        *self.total_count.borrow()
    }

    pub fn set_total_count(&self, count: u64) {
        self.total_count.send_replace(count);
    }

    pub fn watch_total_count(&self) -> watch::Receiver<u64> {
        self.total_count.subscribe()
    }
}

impl Default for ServersStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Store of per-server probe history, indexed by the owning server.
pub struct ServerStatusesStore {
    entries: KeyedStore<ServerStatus>,
}

impl ServerStatusesStore {
    pub fn new() -> Self {
        let entries = KeyedStore::new(
            vec![KeySpec {
                name: "uuid",
                extract: |s: &ServerStatus| s.uuid.clone(),
            }],
            vec![KeySpec {
                name: "server_uuid",
                extract: |s: &ServerStatus| s.server_uuid.clone(),
            }],
        )
        .expect("uuid primary key declared");
        Self { entries }
    }

    pub fn upsert<I: IntoIterator<Item = ServerStatus>>(&self, statuses: I) {
        self.entries.upsert(statuses);
    }

    pub fn get(&self, uuid: &str) -> Option<Arc<ServerStatus>> {
        self.entries.get("uuid", uuid)
    }

    /// Probe history for one server, in upsert order (the fetch service
    /// requests ascending `created_at`).
    pub fn for_server(&self, server_uuid: &str) -> Vec<Arc<ServerStatus>> {
        self.entries.get_by_index("server_uuid", server_uuid)
    }

    pub fn all(&self) -> Vec<Arc<ServerStatus>> {
        self.entries.all()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn subscribe(&self) -> StoreWatch<ServerStatus> {
        self.entries.subscribe()
    }
}

impl Default for ServerStatusesStore {
    fn default() -> Self {
        Self::new()
    }
}
