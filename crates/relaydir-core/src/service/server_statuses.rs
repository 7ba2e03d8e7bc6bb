// ── Server status history fetch service ──

use std::sync::Arc;

use tracing::debug;

use relaydir_api::QueryClient;

use crate::convert::server_status_from_row;
use crate::error::CoreError;
use crate::model::ServerStatus;
use crate::store::ServerStatusesStore;

/// Fetches probe history rows for a set of servers into a
/// [`ServerStatusesStore`].
pub struct ServerStatusesService {
    client: Arc<QueryClient>,
    store: Arc<ServerStatusesStore>,
    table: String,
}

impl ServerStatusesService {
    pub fn new(
        client: Arc<QueryClient>,
        store: Arc<ServerStatusesStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            store,
            table: table.into(),
        }
    }

    /// Fetch all statuses for the given servers, oldest first, and merge
    /// them into the store.
    pub async fn fetch<S: AsRef<str>>(&self, server_uuids: &[S]) -> Result<(), CoreError> {
        let page = self
            .client
            .from(&self.table)?
            .in_list("server_uuid", server_uuids)
            .order("created_at", true)
            .execute()
            .await?;

        let statuses = page
            .rows
            .into_iter()
            .map(server_status_from_row)
            .collect::<Result<Vec<ServerStatus>, _>>()?;

        debug!(count = statuses.len(), "merging fetched server statuses");
        self.store.upsert(statuses);
        Ok(())
    }
}
