//! Fetch services: one per entity kind.
//!
//! Each service owns a shared [`QueryClient`](relaydir_api::QueryClient)
//! and exactly one store, and is the only writer to that store. Stores
//! are constructed first, then handed to their service (explicit wiring;
//! no module-level singletons). A failed remote call surfaces before any
//! store mutation happens.

pub mod bot_details;
pub mod bot_statuses;
pub mod bots;
pub mod countries;
pub mod server_statuses;
pub mod servers;

use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::CoreError;

pub use bot_details::BotDetailsService;
pub use bot_statuses::BotStatusesService;
pub use bots::{BotFilter, BotsService};
pub use countries::CountriesService;
pub use server_statuses::ServerStatusesService;
pub use servers::{ServerFilter, ServersService, StatusFilter};

// ── Shared filter/sort types ────────────────────────────────────────

/// Inclusive or exclusive set membership filter.
///
/// Inclusive applies one IN predicate. Exclusive applies one NEQ
/// predicate per value — the backend's query grammar has no NOT-IN, so
/// exclusions are ANDed individually (observed backend behavior, kept
/// as-is).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFilter {
    pub inclusive: bool,
    pub values: Vec<String>,
}

impl SetFilter {
    pub fn including<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> Self {
        Self {
            inclusive: true,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn excluding<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> Self {
        Self {
            inclusive: false,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Sortable columns across the directory listings.
///
/// Serialized names are the wire column names; `LastCheck` is the one
/// domain name that differs from its wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortField {
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "host")]
    Host,
    #[strum(serialize = "identity")]
    Identity,
    #[strum(serialize = "country")]
    Country,
    #[strum(serialize = "protocol")]
    Protocol,
    #[strum(serialize = "address")]
    Address,
    #[strum(serialize = "is_online")]
    IsOnline,
    #[strum(serialize = "uptime7")]
    Uptime7,
    #[strum(serialize = "uptime30")]
    Uptime30,
    #[strum(serialize = "uptime90")]
    Uptime90,
    #[strum(serialize = "last_check")]
    LastCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sort specification applied to a listing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    pub(crate) fn ascending(&self) -> bool {
        self.order == SortOrder::Asc
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Zero-based inclusive row window for a one-based page number.
pub(crate) fn page_window(page_size: u64, page_number: u64) -> (u64, u64) {
    let start = page_size * page_number.saturating_sub(1);
    (start, start + page_size.saturating_sub(1))
}

/// Map an edge-function failure into a domain write error, extracting
/// the server's `{error: ...}` message when the body carries one.
pub(crate) fn write_error(err: relaydir_api::Error, fallback: &str) -> CoreError {
    match err {
        relaydir_api::Error::EdgeFunction { body, .. } => {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| fallback.to_owned());
            CoreError::RemoteWrite { message }
        }
        other => CoreError::Api(other),
    }
}
