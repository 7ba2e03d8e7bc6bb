// ── Persisted flagged-server set ──

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use super::storage::KvStorage;

const STORAGE_KEY: &str = "flagged_servers";
const SEPARATOR: &str = " ";

/// Set of server URIs the user has flagged, persisted as a single
/// space-joined string. Server URIs never contain spaces, so the join is
/// lossless. Every mutation republishes a snapshot and writes through.
pub struct FlaggedStore {
    storage: Arc<dyn KvStorage>,
    state: watch::Sender<Arc<BTreeSet<String>>>,
}

impl FlaggedStore {
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        let (state, _) = watch::channel(Arc::new(load(storage.as_ref())));
        Self { storage, state }
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.state.borrow().contains(uri)
    }

    pub fn items(&self) -> Vec<String> {
        self.state.borrow().iter().cloned().collect()
    }

    pub fn toggle(&self, uri: &str) {
        self.mutate(|uris| {
            if !uris.remove(uri) {
                uris.insert(uri.to_owned());
            }
        });
    }

    pub fn set(&self, uri: &str, flagged: bool) {
        self.mutate(|uris| {
            if flagged {
                uris.insert(uri.to_owned());
            } else {
                uris.remove(uri);
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BTreeSet<String>>> {
        self.state.subscribe()
    }

    fn mutate(&self, apply: impl FnOnce(&mut BTreeSet<String>)) {
        let mut next = BTreeSet::clone(&self.state.borrow());
        apply(&mut next);
        let joined = next.iter().cloned().collect::<Vec<_>>().join(SEPARATOR);
        self.storage.set(STORAGE_KEY, &joined);
        self.state.send_replace(Arc::new(next));
    }
}

fn load(storage: &dyn KvStorage) -> BTreeSet<String> {
    storage
        .get(STORAGE_KEY)
        .map(|raw| {
            raw.split(SEPARATOR)
                .filter(|uri| !uri.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
