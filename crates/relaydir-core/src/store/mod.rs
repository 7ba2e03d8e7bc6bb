//! Reactive in-memory stores.
//!
//! [`KeyedStore`] is the generic engine: entities indexed by declared
//! primary and secondary keys, with whole-snapshot publication on every
//! mutation. The per-entity stores wrap it with concrete key
//! declarations and, where the backend reports one, a total match count.

pub mod bots;
pub mod countries;
pub mod keyed;
pub mod servers;

pub use bots::{BotDetailsStore, BotStatusesStore, BotsStore};
pub use countries::CountriesStore;
pub use keyed::{KeySpec, KeyedStore, StoreWatch};
pub use servers::{ServerStatusesStore, ServersStore};
