// ── Hash-fragment query parameters ──

use std::sync::Arc;

use tokio::sync::watch;
use url::form_urlencoded;

use super::storage::KvStorage;

/// Ordered `key=value&key=value` parameter list as carried in a URL
/// fragment, with percent-encoding on both sides. Last occurrence of a
/// key wins on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashParams {
    pairs: Vec<(String, String)>,
}

impl HashParams {
    /// Decode a raw fragment (without the leading `#`).
    pub fn parse(fragment: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(fragment.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set the value for a key in place, keeping its position; a new key
    /// is appended.
    pub fn set(&mut self, key: &str, value: &str) {
        self.pairs.retain(|(k, _)| k != key);
        self.pairs.push((key.to_owned(), value.to_owned()));
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Encode back to a fragment string.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

/// A single persisted string parameter resolved hash-first, then from
/// storage, then from a default. `set` writes through to both the hash
/// and storage; `reset` removes it from both and restores the default.
pub struct QueryParamStore {
    key: String,
    default_value: String,
    storage: Arc<dyn KvStorage>,
    state: watch::Sender<String>,
}

impl QueryParamStore {
    pub fn new(
        key: impl Into<String>,
        default_value: impl Into<String>,
        storage: Arc<dyn KvStorage>,
        hash: &HashParams,
    ) -> Self {
        let key = key.into();
        let default_value = default_value.into();
        let initial = hash
            .get(&key)
            .map(str::to_owned)
            .or_else(|| storage.get(&key))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default_value.clone());
        let (state, _) = watch::channel(initial);
        Self {
            key,
            default_value,
            storage,
            state,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> String {
        self.state.borrow().clone()
    }

    pub fn set(&self, value: &str, hash: &mut HashParams) {
        hash.set(&self.key, value);
        self.storage.set(&self.key, value);
        self.state.send_replace(value.to_owned());
    }

    pub fn reset(&self, hash: &mut HashParams) {
        hash.remove(&self.key);
        self.storage.remove(&self.key);
        self.state.send_replace(self.default_value.clone());
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.state.subscribe()
    }
}
