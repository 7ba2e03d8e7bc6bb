// ── Persisted label sets ──

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tokio::sync::watch;
use tracing::warn;

use super::storage::KvStorage;

const STORAGE_KEY: &str = "labels_servers_uuid";

/// User-assigned label on a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Label {
    Added,
    Ignored,
}

type LabelSets = BTreeMap<Label, BTreeSet<String>>;

fn empty_sets() -> LabelSets {
    Label::iter().map(|label| (label, BTreeSet::new())).collect()
}

/// Per-label sets of server uuids, persisted as a JSON object of arrays
/// under one storage key. Missing or corrupt persisted state loads as
/// empty sets; every mutation republishes a snapshot and writes through
/// to storage.
pub struct LabelsStore {
    storage: Arc<dyn KvStorage>,
    state: watch::Sender<Arc<LabelSets>>,
}

impl LabelsStore {
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        let (state, _) = watch::channel(Arc::new(load(storage.as_ref())));
        Self { storage, state }
    }

    pub fn contains(&self, uuid: &str, label: Label) -> bool {
        self.state
            .borrow()
            .get(&label)
            .is_some_and(|set| set.contains(uuid))
    }

    /// Sorted uuids carrying the given label.
    pub fn items(&self, label: Label) -> Vec<String> {
        self.state
            .borrow()
            .get(&label)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn include(&self, uuid: &str, label: Label) {
        self.mutate(|sets| {
            sets.entry(label).or_default().insert(uuid.to_owned());
        });
    }

    pub fn exclude(&self, uuid: &str, label: Label) {
        self.mutate(|sets| {
            if let Some(set) = sets.get_mut(&label) {
                set.remove(uuid);
            }
        });
    }

    pub fn toggle(&self, uuid: &str, label: Label) {
        self.mutate(|sets| {
            let set = sets.entry(label).or_default();
            if !set.remove(uuid) {
                set.insert(uuid.to_owned());
            }
        });
    }

    /// Replace the whole state from an exported object of arrays.
    /// Unknown labels are dropped.
    pub fn import(&self, exported: &BTreeMap<String, Vec<String>>) {
        self.mutate(|sets| {
            *sets = empty_sets();
            for label in Label::iter() {
                if let Some(uuids) = exported.get(&label.to_string()) {
                    sets.insert(label, uuids.iter().cloned().collect());
                }
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LabelSets>> {
        self.state.subscribe()
    }

    fn mutate(&self, apply: impl FnOnce(&mut LabelSets)) {
        let mut next = LabelSets::clone(&self.state.borrow());
        apply(&mut next);
        persist(self.storage.as_ref(), &next);
        self.state.send_replace(Arc::new(next));
    }
}

fn persist(storage: &dyn KvStorage, sets: &LabelSets) {
    let object: Map<String, Value> = sets
        .iter()
        .map(|(label, uuids)| (label.to_string(), json!(uuids)))
        .collect();
    storage.set(STORAGE_KEY, &Value::Object(object).to_string());
}

fn load(storage: &dyn KvStorage) -> LabelSets {
    let Some(raw) = storage.get(STORAGE_KEY) else {
        return empty_sets();
    };
    match serde_json::from_str::<BTreeMap<String, BTreeSet<String>>>(&raw) {
        Ok(parsed) => Label::iter()
            .map(|label| {
                let uuids = parsed.get(&label.to_string()).cloned().unwrap_or_default();
                (label, uuids)
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "corrupt persisted labels, starting empty");
            empty_sets()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::storage::MemoryStorage;
    use super::*;

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn include_and_toggle_persist_immediately() {
        let storage = storage();
        let store = LabelsStore::new(storage.clone());

        store.include("u1", Label::Added);
        store.toggle("u2", Label::Ignored);
        store.toggle("u2", Label::Ignored);

        let raw = storage.get("labels_servers_uuid").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["added"], serde_json::json!(["u1"]));
        assert_eq!(parsed["ignored"], serde_json::json!([]));
    }

    #[test]
    fn state_survives_a_reload() {
        let storage = storage();
        {
            let store = LabelsStore::new(storage.clone());
            store.include("u1", Label::Added);
            store.include("u2", Label::Added);
            store.exclude("u1", Label::Added);
        }
        let store = LabelsStore::new(storage);
        assert_eq!(store.items(Label::Added), ["u2"]);
        assert!(store.items(Label::Ignored).is_empty());
    }

    #[test]
    fn corrupt_state_loads_as_empty() {
        let storage = storage();
        storage.set("labels_servers_uuid", "not json");
        let store = LabelsStore::new(storage);
        assert!(store.items(Label::Added).is_empty());
        assert!(store.items(Label::Ignored).is_empty());
    }

    #[test]
    fn import_replaces_state_and_drops_unknown_labels() {
        let storage = storage();
        let store = LabelsStore::new(storage);
        store.include("old", Label::Ignored);

        let exported = BTreeMap::from([
            ("added".to_owned(), vec!["a".to_owned(), "b".to_owned()]),
            ("bookmarked".to_owned(), vec!["x".to_owned()]),
        ]);
        store.import(&exported);

        assert_eq!(store.items(Label::Added), ["a", "b"]);
        assert!(store.items(Label::Ignored).is_empty());
    }
}
