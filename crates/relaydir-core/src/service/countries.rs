// ── Countries fetch service ──

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use relaydir_api::QueryClient;

use crate::error::CoreError;
use crate::store::CountriesStore;

#[derive(Deserialize)]
struct CountryRow {
    country: Option<String>,
}

/// Populates a [`CountriesStore`] from the distinct country codes seen
/// in the servers listing.
pub struct CountriesService {
    client: Arc<QueryClient>,
    store: Arc<CountriesStore>,
    table: String,
}

impl CountriesService {
    pub fn new(
        client: Arc<QueryClient>,
        store: Arc<CountriesStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            table: table.into(),
        }
    }

    /// Fetch the country column and union the codes into the store.
    /// NULL and empty codes are dropped.
    pub async fn fetch(&self) -> Result<(), CoreError> {
        let page = self.client.from(&self.table)?.select("country").execute().await?;

        let countries: Vec<String> = page
            .rows
            .into_iter()
            .filter_map(|row| {
                serde_json::from_value::<CountryRow>(row)
                    .ok()
                    .and_then(|r| r.country)
            })
            .collect();

        debug!(count = countries.len(), "merging fetched countries");
        self.store.add(countries);
        Ok(())
    }
}
