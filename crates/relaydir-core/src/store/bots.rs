// ── Bot stores ──

use std::sync::Arc;

use tokio::sync::watch;

use super::keyed::{KeySpec, KeyedStore, StoreWatch};
use crate::model::{Bot, BotDetails, BotStatus};

/// Store of bot directory entries, keyed by `uuid`.
pub struct BotsStore {
    entries: KeyedStore<Bot>,
    total_count: watch::Sender<u64>,
}

impl BotsStore {
    pub fn new() -> Self {
        let entries = KeyedStore::new(
            vec![KeySpec {
                name: "uuid",
                extract: |b: &Bot| b.uuid.clone(),
            }],
            vec![],
        )
        .expect("uuid primary key declared");
        let (total_count, _) = watch::channel(0);
        Self {
            entries,
            total_count,
        }
    }

    pub fn upsert<I: IntoIterator<Item = Bot>>(&self, bots: I) {
        self.entries.upsert(bots);
    }

    pub fn get(&self, uuid: &str) -> Option<Arc<Bot>> {
        self.entries.get("uuid", uuid)
    }

    pub fn all(&self) -> Vec<Arc<Bot>> {
        self.entries.all()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.total_count.send_replace(0);
    }

    pub fn subscribe(&self) -> StoreWatch<Bot> {
        self.entries.subscribe()
    }

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

impl Default for BotsStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Store of per-bot probe history, indexed by the owning bot.
pub struct BotStatusesStore {
    entries: KeyedStore<BotStatus>,
}

impl BotStatusesStore {
    pub fn new() -> Self {
        let entries = KeyedStore::new(
            vec![KeySpec {
                name: "uuid",
                extract: |s: &BotStatus| s.uuid.clone(),
            }],
            vec![KeySpec {
                name: "bot_uuid",
                extract: |s: &BotStatus| s.bot_uuid.clone(),
            }],
        )
        .expect("uuid primary key declared");
        Self { entries }
    }

    pub fn upsert<I: IntoIterator<Item = BotStatus>>(&self, statuses: I) {
        self.entries.upsert(statuses);
    }

    pub fn for_bot(&self, bot_uuid: &str) -> Vec<Arc<BotStatus>> {
        self.entries.get_by_index("bot_uuid", bot_uuid)
    }

    pub fn all(&self) -> Vec<Arc<BotStatus>> {
        self.entries.all()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn subscribe(&self) -> StoreWatch<BotStatus> {
        self.entries.subscribe()
    }
}

impl Default for BotStatusesStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Store of lazily fetched bot detail records, keyed by the bot's uuid.
pub struct BotDetailsStore {
    entries: KeyedStore<BotDetails>,
}

impl BotDetailsStore {
    pub fn new() -> Self {
        let entries = KeyedStore::new(
            vec![KeySpec {
                name: "bot_uuid",
                extract: |d: &BotDetails| d.bot_uuid.clone(),
            }],
            vec![],
        )
        .expect("bot_uuid primary key declared");
        Self { entries }
    }

    pub fn upsert(&self, details: BotDetails) {
        self.entries.upsert([details]);
    }

    pub fn get(&self, bot_uuid: &str) -> Option<Arc<BotDetails>> {
        self.entries.get("bot_uuid", bot_uuid)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn subscribe(&self) -> StoreWatch<BotDetails> {
        self.entries.subscribe()
    }
}

impl Default for BotDetailsStore {
    fn default() -> Self {
        Self::new()
    }
}
