// ── Bots fetch service ──

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::debug;

use relaydir_api::{CmpOp, Expr, QueryBuilder, QueryClient, escape_value};

use super::servers::{apply_set_filter, apply_uptime};
use super::{SetFilter, Sort, page_window, write_error};
use crate::convert::bot_from_row;
use crate::error::CoreError;
use crate::model::Bot;
use crate::store::BotsStore;

/// Structured filter over the bots listing.
#[derive(Debug, Clone, Default)]
pub struct BotFilter {
    pub is_online: Option<bool>,
    /// Free-text search matched against name and description with OR
    /// semantics.
    pub text: Option<String>,
    pub uuids: Option<SetFilter>,
    pub uptime7: Option<f64>,
    pub uptime30: Option<f64>,
    pub uptime90: Option<f64>,
}

/// Fetches bot entries and writes them into a [`BotsStore`].
pub struct BotsService {
    client: Arc<QueryClient>,
    store: Arc<BotsStore>,
    table: String,
}

impl BotsService {
    pub fn new(client: Arc<QueryClient>, store: Arc<BotsStore>, table: impl Into<String>) -> Self {
        Self {
            client,
            store,
            table: table.into(),
        }
    }

    /// Fetch one page of the bots listing. Same contract as the servers
    /// fetch: upsert on success, total count when reported, uuids in
    /// server order.
    pub async fn fetch(
        &self,
        filter: &BotFilter,
        sort: &Sort,
        page_size: u64,
        page_number: u64,
    ) -> Result<Vec<String>, CoreError> {
        let mut query = self.client.from(&self.table)?.count_exact();
        query = apply_bot_filter(query, filter);
        query = query.order(&sort.field.to_string(), sort.ascending());

        let (from, to) = page_window(page_size, page_number);
        let page = query.range(from, to).execute().await?;

        let bots = page
            .rows
            .into_iter()
            .map(bot_from_row)
            .collect::<Result<Vec<Bot>, _>>()?;
        let uuids: Vec<String> = bots.iter().map(|b| b.uuid.clone()).collect();

        debug!(count = bots.len(), "merging fetched bots");
        self.store.upsert(bots);
        if let Some(total) = page.total {
            self.store.set_total_count(total);
        }
        Ok(uuids)
    }

    /// Submit a new bot address for listing.
    pub async fn add_bot(&self, url: &str) -> Result<(), CoreError> {
        self.client
            .invoke_function("add-bot", Method::POST, &json!({ "url": url }))
            .await
            .map_err(|e| write_error(e, "Failed to add bot"))
    }
}

fn apply_bot_filter(mut query: QueryBuilder, filter: &BotFilter) -> QueryBuilder {
    if let Some(is_online) = filter.is_online {
        query = query.eq("is_online", is_online);
    }

    if let Some(uuids) = &filter.uuids {
        query = apply_set_filter(query, "uuid", uuids);
    }

    if let Some(text) = filter.text.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("*{}*", escape_value(text));
        let expr = Expr::Or(vec![
            Expr::cmp("name", CmpOp::Ilike, pattern.clone()),
            Expr::cmp("description", CmpOp::Ilike, pattern),
        ]);
        query = query.or_filter(&expr);
    }

    query = apply_uptime(query, "uptime7", filter.uptime7);
    query = apply_uptime(query, "uptime30", filter.uptime30);
    query = apply_uptime(query, "uptime90", filter.uptime90);

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaydir_api::QueryClient;
    use url::Url;

    fn query() -> QueryBuilder {
        let client = QueryClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost").expect("url"),
            "key".to_string().into(),
        );
        client.from("v_bot_summaries").expect("query")
    }

    #[test]
    fn text_search_matches_name_or_description() {
        let filter = BotFilter {
            text: Some("weather".into()),
            ..BotFilter::default()
        };
        let q = apply_bot_filter(query(), &filter);
        assert_eq!(
            q.params(),
            [(
                "or".to_owned(),
                "(name.ilike.*weather*,description.ilike.*weather*)".to_owned()
            )]
        );
    }

    #[test]
    fn online_filter_is_plain_eq() {
        let filter = BotFilter {
            is_online: Some(false),
            ..BotFilter::default()
        };
        let q = apply_bot_filter(query(), &filter);
        assert_eq!(q.params(), [("is_online".to_owned(), "eq.false".to_owned())]);
    }

    #[test]
    fn empty_text_adds_no_predicate() {
        let filter = BotFilter {
            text: Some(String::new()),
            ..BotFilter::default()
        };
        let q = apply_bot_filter(query(), &filter);
        assert!(q.params().is_empty());
    }
}
