// ── Country aggregate store ──

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

/// Deduplicated, sorted set of country codes seen across directory
/// entries. Fed by the countries fetch service; only ever grows until
/// cleared.
pub struct CountriesStore {
    state: watch::Sender<Arc<BTreeSet<String>>>,
}

impl CountriesStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(BTreeSet::new()));
        Self { state }
    }

    /// Union the given codes into the set. Empty and duplicate codes are
    /// dropped; publishing happens once per call.
    pub fn add<I, S>(&self, countries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = BTreeSet::clone(&self.state.borrow());
        let mut changed = false;
        for country in countries {
            let country = country.into();
            if !country.is_empty() && next.insert(country) {
                changed = true;
            }
        }
        if changed {
            self.state.send_replace(Arc::new(next));
        }
    }

    /// Sorted list of known country codes.
    pub fn items(&self) -> Vec<String> {
        self.state.borrow().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.state.send_replace(Arc::new(BTreeSet::new()));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BTreeSet<String>>> {
        self.state.subscribe()
    }
}

impl Default for CountriesStore {
    fn default() -> Self {
        Self::new()
    }
}
