// ── Generic keyed reactive store ──
//
// In-memory index of one entity type by one or more primary keys plus
// zero or more secondary index keys, with push-based change notification
// via `watch` channels. Every mutation publishes a whole new immutable
// snapshot, so the cross-key invariant holds at every observable point
// even when upsert batches interleave.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::CoreError;

/// A named key over an entity type, with an explicit extraction function.
///
/// Extraction replaces field-name reflection: each declared key states how
/// to read its value from an entity, so the store stays decoupled from the
/// entity's layout.
pub struct KeySpec<T> {
    pub name: &'static str,
    pub extract: fn(&T) -> String,
}

impl<T> Clone for KeySpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for KeySpec<T> {}

/// Immutable snapshot of the store contents.
///
/// `primary` maps each declared primary key name to `value -> entity`;
/// `index` maps each declared index key name to `value -> ordered bucket`.
/// Invariant: an entity present under one primary key is present under
/// every primary key, and sits in exactly the buckets its current index
/// field values dictate.
#[derive(Debug)]
pub struct StoreState<T> {
    primary: HashMap<&'static str, HashMap<String, Arc<T>>>,
    index: HashMap<&'static str, HashMap<String, Vec<Arc<T>>>>,
}

impl<T> Clone for StoreState<T> {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            index: self.index.clone(),
        }
    }
}

/// A reactive store for a single entity type, indexed by declared keys.
pub struct KeyedStore<T> {
    primary_keys: Vec<KeySpec<T>>,
    index_keys: Vec<KeySpec<T>>,
    state: watch::Sender<Arc<StoreState<T>>>,
}

impl<T: Send + Sync + 'static> KeyedStore<T> {
    /// Create a store. At least one primary key must be declared.
    pub fn new(
        primary_keys: Vec<KeySpec<T>>,
        index_keys: Vec<KeySpec<T>>,
    ) -> Result<Self, CoreError> {
        if primary_keys.is_empty() {
            return Err(CoreError::Configuration {
                reason: "at least one primary key must be declared".into(),
            });
        }
        let empty = Self::empty_state(&primary_keys, &index_keys);
        let (state, _) = watch::channel(Arc::new(empty));
        Ok(Self {
            primary_keys,
            index_keys,
            state,
        })
    }

    fn empty_state(primary_keys: &[KeySpec<T>], index_keys: &[KeySpec<T>]) -> StoreState<T> {
        StoreState {
            primary: primary_keys
                .iter()
                .map(|k| (k.name, HashMap::new()))
                .collect(),
            index: index_keys
                .iter()
                .map(|k| (k.name, HashMap::new()))
                .collect(),
        }
    }

    /// Two entities are the same when any declared primary key matches.
    fn same_entity(&self, a: &T, b: &T) -> bool {
        self.primary_keys
            .iter()
            .any(|pk| (pk.extract)(a) == (pk.extract)(b))
    }

    /// Insert or replace entities, keyed by primary-key equality.
    ///
    /// Every primary map gets the entity under that key's value. Index
    /// buckets replace a matching entry in place (keeping its position)
    /// or append; when an entity's index field value changed, its stale
    /// copy leaves the old bucket. Publishing happens once, after the
    /// whole batch.
    pub fn upsert<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<Arc<T>> = items.into_iter().map(Arc::new).collect();
        if items.is_empty() {
            return;
        }

        let mut next = StoreState::clone(&self.state.borrow());
        for item in &items {
            for pk in &self.primary_keys {
                if let Some(map) = next.primary.get_mut(pk.name) {
                    map.insert((pk.extract)(item), Arc::clone(item));
                }
            }
            for ik in &self.index_keys {
                if let Some(buckets) = next.index.get_mut(ik.name) {
                    let key = (ik.extract)(item);
                    buckets.retain(|value, bucket| {
                        if *value != key {
                            bucket.retain(|e| !self.same_entity(e, item));
                        }
                        !bucket.is_empty()
                    });
                    let bucket = buckets.entry(key).or_default();
                    match bucket.iter().position(|e| self.same_entity(e, item)) {
                        Some(pos) => bucket[pos] = Arc::clone(item),
                        None => bucket.push(Arc::clone(item)),
                    }
                }
            }
        }
        self.state.send_replace(Arc::new(next));
    }

    /// Remove the entities found under `key_name` for the given values.
    ///
    /// Matched entities leave every primary map and every index bucket
    /// (matched by any primary-key equality). No-op when nothing matches
    /// or the key name is undeclared.
    pub fn delete<S: AsRef<str>>(&self, key_name: &str, values: &[S]) {
        if values.is_empty() {
            return;
        }

        let current = self.state.borrow().clone();
        let Some(map) = current.primary.get(key_name) else {
            return;
        };
        let doomed: Vec<Arc<T>> = values
            .iter()
            .filter_map(|v| map.get(v.as_ref()).cloned())
            .collect();
        if doomed.is_empty() {
            return;
        }

        let is_doomed = |e: &Arc<T>| doomed.iter().any(|d| self.same_entity(e, d));

        let mut next = StoreState::clone(&current);
        for pk in &self.primary_keys {
            if let Some(map) = next.primary.get_mut(pk.name) {
                for item in &doomed {
                    map.remove(&(pk.extract)(item));
                }
            }
        }
        for buckets in next.index.values_mut() {
            buckets.retain(|_, bucket| {
                bucket.retain(|e| !is_doomed(e));
                !bucket.is_empty()
            });
        }
        self.state.send_replace(Arc::new(next));
    }

    /// Current entity under a primary key value, if any.
    pub fn get(&self, key_name: &str, value: &str) -> Option<Arc<T>> {
        self.state.borrow().primary.get(key_name)?.get(value).cloned()
    }

    /// Current ordered bucket under an index key value (empty if none).
    pub fn get_by_index(&self, key_name: &str, value: &str) -> Vec<Arc<T>> {
        self.state
            .borrow()
            .index
            .get(key_name)
            .and_then(|buckets| buckets.get(value).cloned())
            .unwrap_or_default()
    }

    /// Every stored entity, read from the first declared primary key's map.
    /// Order is unspecified.
    pub fn all(&self) -> Vec<Arc<T>> {
        let state = self.state.borrow();
        state
            .primary
            .get(self.primary_keys[0].name)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        let state = self.state.borrow();
        state
            .primary
            .get(self.primary_keys[0].name)
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset to the empty state.
    pub fn clear(&self) {
        let empty = Self::empty_state(&self.primary_keys, &self.index_keys);
        self.state.send_replace(Arc::new(empty));
    }

    /// Subscribe to snapshot changes. The returned watch always holds the
    /// latest published snapshot.
    pub fn subscribe(&self) -> StoreWatch<T> {
        StoreWatch {
            rx: self.state.subscribe(),
        }
    }
}

/// Live view over a [`KeyedStore`], vended by [`KeyedStore::subscribe`].
///
/// Lookups read the latest snapshot; [`changed`](Self::changed) suspends
/// until the next mutation is published.
#[derive(Clone)]
pub struct StoreWatch<T> {
    rx: watch::Receiver<Arc<StoreState<T>>>,
}

impl<T> StoreWatch<T> {
    pub fn get(&self, key_name: &str, value: &str) -> Option<Arc<T>> {
        self.rx.borrow().primary.get(key_name)?.get(value).cloned()
    }

    pub fn get_by_index(&self, key_name: &str, value: &str) -> Vec<Arc<T>> {
        self.rx
            .borrow()
            .index
            .get(key_name)
            .and_then(|buckets| buckets.get(value).cloned())
            .unwrap_or_default()
    }

    pub fn all(&self, primary_key: &str) -> Vec<Arc<T>> {
        self.rx
            .borrow()
            .primary
            .get(primary_key)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Wait for the next published snapshot. Returns `false` when the
    /// owning store has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        alias: String,
        group: String,
        payload: u32,
    }

    fn store() -> KeyedStore<Item> {
        KeyedStore::new(
            vec![
                KeySpec {
                    name: "id",
                    extract: |i: &Item| i.id.clone(),
                },
                KeySpec {
                    name: "alias",
                    extract: |i: &Item| i.alias.clone(),
                },
            ],
            vec![KeySpec {
                name: "group",
                extract: |i: &Item| i.group.clone(),
            }],
        )
        .unwrap()
    }

    fn item(id: &str, group: &str, payload: u32) -> Item {
        Item {
            id: id.into(),
            alias: format!("alias-{id}"),
            group: group.into(),
            payload,
        }
    }

    #[test]
    fn zero_primary_keys_is_a_configuration_error() {
        let result: Result<KeyedStore<Item>, _> = KeyedStore::new(vec![], vec![]);
        assert!(matches!(result, Err(CoreError::Configuration { .. })));
    }

    #[test]
    fn upsert_then_get_returns_inserted_entity() {
        let store = store();
        store.upsert([item("a", "g1", 1)]);
        assert_eq!(store.get("id", "a").unwrap().payload, 1);
        assert_eq!(store.get("alias", "alias-a").unwrap().payload, 1);
    }

    #[test]
    fn entities_are_consistent_across_all_primary_keys() {
        let store = store();
        store.upsert([item("a", "g1", 1), item("b", "g1", 2), item("c", "g2", 3)]);
        store.upsert([item("b", "g2", 20)]);

        for it in store.all() {
            let by_alias = store.get("alias", &it.alias).unwrap();
            assert_eq!(*by_alias, *it);
        }
        assert_eq!(store.get("id", "b").unwrap().payload, 20);
    }

    #[test]
    fn upsert_existing_key_replaces_without_duplicating() {
        let store = store();
        store.upsert([item("a", "g1", 1)]);
        store.upsert([item("a", "g1", 2)]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("id", "a").unwrap().payload, 2);
        let bucket = store.get_by_index("group", "g1");
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].payload, 2);
    }

    #[test]
    fn index_replacement_preserves_bucket_position() {
        let store = store();
        store.upsert([item("a", "g1", 1), item("b", "g1", 2), item("c", "g1", 3)]);
        store.upsert([item("b", "g1", 20)]);

        let bucket = store.get_by_index("group", "g1");
        let ids: Vec<&str> = bucket.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(bucket[1].payload, 20);
    }

    #[test]
    fn index_key_change_moves_entity_between_buckets() {
        let store = store();
        store.upsert([item("a", "g1", 1), item("b", "g1", 2)]);
        store.upsert([item("a", "g2", 10)]);

        let g1_bucket = store.get_by_index("group", "g1");
        let g1: Vec<&str> = g1_bucket.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(g1, ["b"]);
        let g2 = store.get_by_index("group", "g2");
        assert_eq!(g2.len(), 1);
        assert_eq!(g2[0].payload, 10);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn emptied_bucket_is_dropped_after_index_move() {
        let store = store();
        store.upsert([item("a", "g1", 1)]);
        store.upsert([item("a", "g2", 2)]);
        assert!(store.get_by_index("group", "g1").is_empty());
    }

    #[test]
    fn delete_removes_from_primary_and_index_maps() {
        let store = store();
        store.upsert([item("a", "g1", 1), item("b", "g1", 2)]);
        store.delete("id", &["a"]);

        assert!(store.get("id", "a").is_none());
        assert!(store.get("alias", "alias-a").is_none());
        let ids: Vec<String> = store
            .get_by_index("group", "g1")
            .iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(ids, ["b"]);
    }

    #[test]
    fn delete_by_secondary_primary_key_works() {
        let store = store();
        store.upsert([item("a", "g1", 1)]);
        store.delete("alias", &["alias-a"]);
        assert!(store.is_empty());
        assert!(store.get_by_index("group", "g1").is_empty());
    }

    #[test]
    fn delete_missing_key_is_a_noop() {
        let store = store();
        store.upsert([item("a", "g1", 1)]);
        store.delete("id", &["zzz"]);
        store.delete("unknown-key", &["a"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_upsert_is_a_noop() {
        let store = store();
        let mut watch = store.subscribe();
        // Mark current value seen so `has_changed` reflects new sends only.
        let _ = watch.rx.borrow_and_update();
        store.upsert(std::iter::empty::<Item>());
        assert!(!watch.rx.has_changed().unwrap());
    }

    #[test]
    fn clear_empties_every_view() {
        let store = store();
        store.upsert([item("a", "g1", 1), item("b", "g2", 2)]);
        store.clear();

        assert!(store.all().is_empty());
        assert!(store.get("id", "a").is_none());
        assert!(store.get_by_index("group", "g2").is_empty());
    }

    #[tokio::test]
    async fn watch_sees_new_snapshots() {
        let store = store();
        let mut watch = store.subscribe();
        assert!(watch.all("id").is_empty());

        store.upsert([item("a", "g1", 1)]);
        assert!(watch.changed().await);
        assert_eq!(watch.all("id").len(), 1);
        assert_eq!(watch.get("id", "a").unwrap().payload, 1);
        assert_eq!(watch.get_by_index("group", "g1").len(), 1);
    }
}
