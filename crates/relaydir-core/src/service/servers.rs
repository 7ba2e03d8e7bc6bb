// ── Servers fetch service ──

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::debug;

use relaydir_api::{QueryBuilder, QueryClient};

use super::{SetFilter, Sort, page_window, write_error};
use crate::convert::server_from_row;
use crate::error::CoreError;
use crate::filter::{FilterGroup, apply_filter};
use crate::model::{Protocol, Server};
use crate::store::ServersStore;

/// Tri-state status filter: a probed up/down state, or entries that have
/// never been probed (NULL status on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Online,
    Offline,
    Unknown,
}

/// Structured filter over the servers listing. Every field is optional;
/// `None` contributes no predicate.
#[derive(Debug, Clone, Default)]
pub struct ServerFilter {
    pub status: Option<StatusFilter>,
    pub uuids: Option<SetFilter>,
    pub identity: Option<String>,
    pub host: Option<String>,
    pub countries: Option<SetFilter>,
    pub protocol: Option<Protocol>,
    pub info_page_available: Option<bool>,
    pub uptime7: Option<f64>,
    pub uptime30: Option<f64>,
    pub uptime90: Option<f64>,
}

/// Fetches directory entries and writes them into a [`ServersStore`].
pub struct ServersService {
    client: Arc<QueryClient>,
    store: Arc<ServersStore>,
    table: String,
}

impl ServersService {
    pub fn new(client: Arc<QueryClient>, store: Arc<ServersStore>, table: impl Into<String>) -> Self {
        Self {
            client,
            store,
            table: table.into(),
        }
    }

    /// Fetch one page of the listing with a typed filter and sort.
    ///
    /// On success the fetched entities are merged into the store, the
    /// total match count is updated when the backend reports one, and
    /// the page's uuids are returned in server order. On failure the
    /// store is left untouched.
    pub async fn fetch(
        &self,
        filter: &ServerFilter,
        sort: &Sort,
        page_size: u64,
        page_number: u64,
    ) -> Result<Vec<String>, CoreError> {
        let mut query = self.client.from(&self.table)?.count_exact();
        query = apply_server_filter(query, filter);
        query = query.order(&sort.field.to_string(), sort.ascending());

        let (from, to) = page_window(page_size, page_number);
        let page = query.range(from, to).execute().await?;

        self.ingest(page.rows, page.total)
    }

    /// Fetch one page with a generic filter tree instead of the typed
    /// filter (no sort applied).
    pub async fn fetch_filtered(
        &self,
        filter: Option<&FilterGroup>,
        page_size: u64,
        page_number: u64,
    ) -> Result<Vec<String>, CoreError> {
        let query = self.client.from(&self.table)?.count_exact();
        let query = apply_filter(query, filter)?;

        let (from, to) = page_window(page_size, page_number);
        let page = query.range(from, to).execute().await?;

        self.ingest(page.rows, page.total)
    }

    /// Submit a new server URI for listing.
    pub async fn add_server(&self, uri: &str) -> Result<(), CoreError> {
        self.client
            .invoke_function("add-server", Method::POST, &json!({ "uri": uri }))
            .await
            .map_err(|e| write_error(e, "Failed to add server"))
    }

    fn ingest(
        &self,
        rows: Vec<serde_json::Value>,
        total: Option<u64>,
    ) -> Result<Vec<String>, CoreError> {
        let servers = rows
            .into_iter()
            .map(server_from_row)
            .collect::<Result<Vec<Server>, _>>()?;
        let uuids: Vec<String> = servers.iter().map(|s| s.uuid.clone()).collect();

        debug!(count = servers.len(), "merging fetched servers");
        self.store.upsert(servers);
        if let Some(total) = total {
            self.store.set_total_count(total);
        }
        Ok(uuids)
    }
}

/// Translate the typed filter into native predicates, one per active
/// field.
fn apply_server_filter(mut query: QueryBuilder, filter: &ServerFilter) -> QueryBuilder {
    match filter.status {
        Some(StatusFilter::Online) => query = query.eq("status", true),
        Some(StatusFilter::Offline) => query = query.eq("status", false),
        Some(StatusFilter::Unknown) => query = query.is_null("status"),
        None => {}
    }

    if let Some(uuids) = &filter.uuids {
        query = apply_set_filter(query, "uuid", uuids);
    }

    if let Some(identity) = filter.identity.as_deref().filter(|s| !s.is_empty()) {
        query = query.ilike("identity", &format!("*{identity}*"));
    }

    if let Some(host) = filter.host.as_deref().filter(|s| !s.is_empty()) {
        query = query.ilike("host", &format!("*{host}*"));
    }

    if let Some(countries) = &filter.countries {
        query = apply_set_filter(query, "country", countries);
    }

    if let Some(protocol) = filter.protocol {
        query = query.eq("protocol", protocol.wire_code());
    }

    if let Some(available) = filter.info_page_available {
        query = query.eq("info_page_available", available);
    }

    query = apply_uptime(query, "uptime7", filter.uptime7);
    query = apply_uptime(query, "uptime30", filter.uptime30);
    query = apply_uptime(query, "uptime90", filter.uptime90);

    query
}

pub(crate) fn apply_set_filter(query: QueryBuilder, field: &str, set: &SetFilter) -> QueryBuilder {
    if set.inclusive {
        query.in_list(field, &set.values)
    } else {
        // No NOT-IN in the query grammar: exclusions become one NEQ each.
        set.values
            .iter()
            .fold(query, |q, value| q.neq(field, value))
    }
}

pub(crate) fn apply_uptime(query: QueryBuilder, field: &str, threshold: Option<f64>) -> QueryBuilder {
    match threshold {
        Some(t) if t > 0.0 => query.gte(field, t),
        _ => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{SortField, SortOrder};
    use relaydir_api::QueryClient;
    use url::Url;

    fn query() -> QueryBuilder {
        let client = QueryClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost").expect("url"),
            "key".to_string().into(),
        );
        client.from("servers_view").expect("query")
    }

    #[test]
    fn empty_filter_adds_no_predicates() {
        let q = apply_server_filter(query(), &ServerFilter::default());
        assert!(q.params().is_empty());
    }

    #[test]
    fn unknown_status_becomes_is_null() {
        let filter = ServerFilter {
            status: Some(StatusFilter::Unknown),
            ..ServerFilter::default()
        };
        let q = apply_server_filter(query(), &filter);
        assert_eq!(q.params(), [("status".to_owned(), "is.null".to_owned())]);
    }

    #[test]
    fn exclusive_set_becomes_individual_neq_predicates() {
        let filter = ServerFilter {
            uuids: Some(SetFilter::excluding(["a", "b"])),
            ..ServerFilter::default()
        };
        let q = apply_server_filter(query(), &filter);
        assert_eq!(
            q.params(),
            [
                ("uuid".to_owned(), "neq.a".to_owned()),
                ("uuid".to_owned(), "neq.b".to_owned()),
            ]
        );
    }

    #[test]
    fn inclusive_set_becomes_in_predicate() {
        let filter = ServerFilter {
            countries: Some(SetFilter::including(["DE", "FR"])),
            ..ServerFilter::default()
        };
        let q = apply_server_filter(query(), &filter);
        assert_eq!(q.params(), [("country".to_owned(), "in.(DE,FR)".to_owned())]);
    }

    #[test]
    fn zero_uptime_threshold_adds_no_predicate() {
        let filter = ServerFilter {
            uptime7: Some(0.0),
            uptime30: Some(55.5),
            ..ServerFilter::default()
        };
        let q = apply_server_filter(query(), &filter);
        assert_eq!(q.params(), [("uptime30".to_owned(), "gte.55.5".to_owned())]);
    }

    #[test]
    fn protocol_filter_uses_wire_code() {
        let filter = ServerFilter {
            protocol: Some(Protocol::Xftp),
            ..ServerFilter::default()
        };
        let q = apply_server_filter(query(), &filter);
        assert_eq!(q.params(), [("protocol".to_owned(), "eq.2".to_owned())]);
    }

    #[test]
    fn sort_uses_wire_field_name() {
        let sort = Sort::new(SortField::LastCheck, SortOrder::Asc);
        assert_eq!(sort.field.to_string(), "last_check");
        assert!(sort.ascending());
    }
}
