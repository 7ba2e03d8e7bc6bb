//! Reactive data layer between `relaydir-api` and UI consumers.
//!
//! This crate owns the domain model, the reactive stores, and the fetch
//! logic for the relay directory workspace:
//!
//! - **[`KeyedStore<T>`](store::KeyedStore)** — generic in-memory entity
//!   store with declared primary and index keys (function-based
//!   extraction, no field reflection). Every mutation publishes a fresh
//!   immutable snapshot over a `tokio::sync::watch` channel, so readers
//!   and [`StoreWatch`](store::StoreWatch) subscribers always observe a
//!   fully consistent state.
//!
//! - **Domain stores** ([`store`]) — one store per entity kind
//!   (`ServersStore`, `BotsStore`, status histories, details, countries)
//!   wrapping `KeyedStore` with the entity's key layout.
//!
//! - **Fetch services** ([`service`]) — one service per store, holding a
//!   shared [`QueryClient`](relaydir_api::QueryClient). Services
//!   translate typed filters into native query predicates, fetch a page,
//!   convert wire rows ([`convert`]) and merge them into their store.
//!
//! - **Filter compiler** ([`filter`]) — composable predicate tree
//!   ([`FilterGroup`](filter::FilterGroup)) compiled directly into query
//!   parameters, with a fast path for flat AND groups.
//!
//! - **Local stores** ([`local`]) — per-user persisted state (labels,
//!   flags, hash-encoded view parameters) over a [`KvStorage`](local::KvStorage)
//!   backend.

pub mod convert;
pub mod error;
pub mod filter;
pub mod local;
pub mod model;
pub mod service;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use filter::{FilterGroup, FilterNode, FilterOp, FilterRule, FilterValue, Glue, apply_filter};
pub use local::{FlaggedStore, HashParams, Label, LabelsStore, QueryParamStore};
pub use service::{
    BotDetailsService, BotFilter, BotStatusesService, BotsService, CountriesService, ServerFilter,
    ServerStatusesService, ServersService, SetFilter, Sort, SortField, SortOrder, StatusFilter,
};
pub use store::{
    BotDetailsStore, BotStatusesStore, BotsStore, CountriesStore, KeySpec, KeyedStore,
    ServerStatusesStore, ServersStore, StoreWatch,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{Bot, BotCommand, BotDetails, BotStatus, Protocol, Server, ServerStatus};
